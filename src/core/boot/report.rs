use tracing::error;

use crate::core::error::LauncherError;

const ERROR_TITLE: &str = "Application launch failed";

/// Tell the user why the launch was aborted and return the exit code.
pub fn report_fatal(err: &LauncherError) -> i32 {
    error!("{}", err);
    eprintln!("{}: {}", ERROR_TITLE, err);
    show_message_box(&err.to_string());
    err.exit_code()
}

#[cfg(target_os = "windows")]
fn show_message_box(message: &str) {
    use windows::core::PCWSTR;
    use windows::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK};

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    let text = to_wide(message);
    let title = to_wide(ERROR_TITLE);
    unsafe {
        let _ = MessageBoxW(
            None,
            PCWSTR(text.as_ptr()),
            PCWSTR(title.as_ptr()),
            MB_OK | MB_ICONERROR,
        );
    }
}

#[cfg(not(target_os = "windows"))]
fn show_message_box(_message: &str) {}
