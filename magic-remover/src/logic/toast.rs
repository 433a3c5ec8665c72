//! Short status popups at the bottom of the window.

use crate::{
    global_util,
    slint_generatedAppWindow::{AppWindow, ToastSetting, ToastStatus},
};
use slint::{ComponentHandle, Timer, TimerMode, Weak};

#[doc(hidden)]
#[macro_export]
macro_rules! toast {
    ($ui:expr, $msg:expr, $status:ident) => {
        $ui.global::<$crate::slint_generatedAppWindow::Util>().invoke_show_toast(
            slint::format!("{}", $msg),
            $crate::slint_generatedAppWindow::ToastStatus::$status,
        )
    };
}

/// Warning toast, used for failures and refused actions
#[macro_export]
macro_rules! toast_warn {
    ($ui:expr, $msg:expr) => {
        $crate::toast!($ui, $msg, Warning)
    };
}

#[macro_export]
macro_rules! toast_success {
    ($ui:expr, $msg:expr) => {
        $crate::toast!($ui, $msg, Success)
    };
}

#[macro_export]
macro_rules! toast_info {
    ($ui:expr, $msg:expr) => {
        $crate::toast!($ui, $msg, Info)
    };
}

/// Shows a toast from a worker thread or a tokio task.
fn async_toast(ui: Weak<AppWindow>, msg: String, status: ToastStatus) {
    _ = ui.upgrade_in_event_loop(move |ui| {
        global_util!(ui).invoke_show_toast(msg.into(), status);
    });
}

pub fn async_toast_warn(ui: Weak<AppWindow>, msg: String) {
    async_toast(ui, msg, ToastStatus::Warning);
}

pub fn async_toast_success(ui: Weak<AppWindow>, msg: String) {
    async_toast(ui, msg, ToastStatus::Success);
}

pub fn async_toast_info(ui: Weak<AppWindow>, msg: String) {
    async_toast(ui, msg, ToastStatus::Info);
}

/// Longer messages stay on screen longer.
fn display_secs(msg: &str) -> u64 {
    if msg.chars().count() > 20 { 5 } else { 2 }
}

pub fn init(ui: &AppWindow) {
    let timer = Timer::default();
    let ui_weak = ui.as_weak();
    global_util!(ui).on_show_toast(move |msg, status| {
        let ui = ui_weak.unwrap();

        if status == ToastStatus::Warning {
            log::warn!("{msg}");
        }

        if timer.running() {
            timer.stop();
        }

        let interval = display_secs(&msg);

        ui.global::<ToastSetting>().set_is_timeout(false);
        ui.global::<ToastSetting>().invoke_set(msg, status);

        timer.start(
            TimerMode::SingleShot,
            std::time::Duration::from_secs(interval),
            move || {
                ui.global::<ToastSetting>().set_is_timeout(true);
            },
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_secs() {
        assert_eq!(display_secs("Saved"), 2);
        assert_eq!(display_secs("Background removed successfully!"), 5);
        assert_eq!(display_secs("背景已成功移除"), 2);
    }
}
