use crossterm::tty::IsTty;
use triage_core::Renderer;

/// Renderer for stdout: colors and hyperlinks only on a terminal.
pub fn stdout_renderer() -> Renderer {
    if !std::io::stdout().is_tty() {
        return Renderer::plain();
    }
    let env = |key: &str| std::env::var(key).ok();
    Renderer::new(color_enabled(env), hyperlinks_supported(env))
}

fn color_enabled(env: impl Fn(&str) -> Option<String>) -> bool {
    env("NO_COLOR").is_none_or(|v| v.is_empty())
}

/// Best-effort OSC 8 support detection from the terminal's environment.
fn hyperlinks_supported(env: impl Fn(&str) -> Option<String>) -> bool {
    if let Some(force) = env("FORCE_HYPERLINK") {
        return !matches!(force.as_str(), "" | "0" | "false");
    }
    if let Some(program) = env("TERM_PROGRAM") {
        if matches!(
            program.as_str(),
            "iTerm.app" | "WezTerm" | "vscode" | "ghostty" | "Hyper" | "Tabby"
        ) {
            return true;
        }
    }
    if let Some(vte) = env("VTE_VERSION") {
        if vte.parse::<u32>().is_ok_and(|v| v >= 5000) {
            return true;
        }
    }
    ["WT_SESSION", "KONSOLE_VERSION", "DOMTERM"]
        .iter()
        .any(|key| env(key).is_some())
}
