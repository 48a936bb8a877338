//! Keystroke tool factory with automatic detection

use std::fmt;
use std::str::FromStr;

#[cfg(target_os = "linux")]
use std::path::Path;
#[cfg(target_os = "linux")]
use std::process::Stdio;

#[cfg(target_os = "linux")]
use tokio::process::Command;

use crate::application::ports::{Keystroke, KeystrokeError};

use super::enigo::EnigoKeystroke;
#[cfg(target_os = "linux")]
use super::wtype::WtypeKeystroke;
#[cfg(target_os = "linux")]
use super::xdotool::XdotoolKeystroke;
#[cfg(target_os = "linux")]
use super::ydotool::YdotoolKeystroke;

/// Concrete keystroke tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystrokeTool {
    /// Cross-platform enigo library
    Enigo,
    /// Linux: ydotool (requires ydotoold daemon)
    Ydotool,
    /// Linux: wtype (Wayland native)
    Wtype,
    /// Linux: xdotool (X11)
    Xdotool,
}

impl fmt::Display for KeystrokeTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Enigo => "enigo",
            Self::Ydotool => "ydotool",
            Self::Wtype => "wtype",
            Self::Xdotool => "xdotool",
        };
        write!(f, "{}", name)
    }
}

/// `keystroke_tool` config value: a concrete tool or `auto`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeystrokeToolPreference {
    #[default]
    Enigo,
    /// Pick the best native tool (Linux only; enigo elsewhere)
    Auto,
    Tool(KeystrokeTool),
}

/// Accepted `keystroke_tool` values on this platform
#[cfg(target_os = "linux")]
pub const VALID_KEYSTROKE_TOOLS: &[&str] = &["enigo", "auto", "ydotool", "xdotool", "wtype"];
#[cfg(not(target_os = "linux"))]
pub const VALID_KEYSTROKE_TOOLS: &[&str] = &["enigo", "auto"];

/// Error type for parsing keystroke tool preference
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid keystroke tool '{value}'. Valid options: {}", VALID_KEYSTROKE_TOOLS.join(", "))]
pub struct ParseKeystrokeToolError {
    pub value: String,
}

impl FromStr for KeystrokeToolPreference {
    type Err = ParseKeystrokeToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if !VALID_KEYSTROKE_TOOLS.contains(&lower.as_str()) {
            return Err(ParseKeystrokeToolError {
                value: s.to_string(),
            });
        }
        Ok(match lower.as_str() {
            "auto" => Self::Auto,
            "ydotool" => Self::Tool(KeystrokeTool::Ydotool),
            "xdotool" => Self::Tool(KeystrokeTool::Xdotool),
            "wtype" => Self::Tool(KeystrokeTool::Wtype),
            _ => Self::Enigo,
        })
    }
}

/// Check if a tool binary is available using `which`
#[cfg(target_os = "linux")]
async fn is_tool_available(tool: &str) -> bool {
    Command::new("which")
        .arg(tool)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// ydotool needs both the binary and the ydotoold socket
#[cfg(target_os = "linux")]
async fn is_ydotool_available() -> bool {
    if !is_tool_available("ydotool").await {
        return false;
    }
    let runtime_socket = std::env::var("XDG_RUNTIME_DIR")
        .map(|dir| format!("{}/.ydotool_socket", dir))
        .ok();
    [runtime_socket, Some("/tmp/.ydotool_socket".to_string())]
        .into_iter()
        .flatten()
        .any(|path| Path::new(&path).exists())
}

#[cfg(target_os = "linux")]
async fn is_available(tool: KeystrokeTool) -> bool {
    match tool {
        KeystrokeTool::Enigo => true,
        KeystrokeTool::Ydotool => is_ydotool_available().await,
        KeystrokeTool::Wtype => is_tool_available("wtype").await,
        KeystrokeTool::Xdotool => is_tool_available("xdotool").await,
    }
}

/// Detect the best available keystroke tool
///
/// On Linux the priority is Wayland-native (wtype, ydotool), then xdotool,
/// then enigo. Other platforms always use enigo.
pub async fn detect_keystroke_tool() -> KeystrokeTool {
    #[cfg(target_os = "linux")]
    {
        let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some();
        let order: &[KeystrokeTool] = if wayland {
            &[KeystrokeTool::Wtype, KeystrokeTool::Ydotool, KeystrokeTool::Xdotool]
        } else {
            &[KeystrokeTool::Xdotool, KeystrokeTool::Ydotool]
        };
        for tool in order {
            if is_available(*tool).await {
                return *tool;
            }
        }
    }
    KeystrokeTool::Enigo
}

fn build(tool: KeystrokeTool) -> Box<dyn Keystroke> {
    match tool {
        #[cfg(target_os = "linux")]
        KeystrokeTool::Ydotool => Box::new(YdotoolKeystroke::new()),
        #[cfg(target_os = "linux")]
        KeystrokeTool::Wtype => Box::new(WtypeKeystroke::new()),
        #[cfg(target_os = "linux")]
        KeystrokeTool::Xdotool => Box::new(XdotoolKeystroke::new()),
        _ => Box::new(EnigoKeystroke::new()),
    }
}

/// Create a keystroke adapter using the specified preference.
///
/// Returns the adapter and the tool actually chosen.
pub async fn create_keystroke(
    preference: KeystrokeToolPreference,
) -> Result<(Box<dyn Keystroke>, KeystrokeTool), KeystrokeError> {
    let tool = match preference {
        KeystrokeToolPreference::Enigo => KeystrokeTool::Enigo,
        KeystrokeToolPreference::Auto => detect_keystroke_tool().await,
        KeystrokeToolPreference::Tool(tool) => {
            #[cfg(target_os = "linux")]
            {
                if !is_available(tool).await {
                    return Err(KeystrokeError::ToolNotFound(match tool {
                        KeystrokeTool::Ydotool => "ydotool",
                        KeystrokeTool::Wtype => "wtype",
                        KeystrokeTool::Xdotool => "xdotool",
                        KeystrokeTool::Enigo => "enigo",
                    }));
                }
            }
            tool
        }
    };
    Ok((build(tool), tool))
}
