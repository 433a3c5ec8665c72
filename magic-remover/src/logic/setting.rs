use super::{editor, tr::tr};
use crate::{
    config, global_logic, global_store,
    slint_generatedAppWindow::{AppWindow, SettingEditor as UISettingEditor, SettingPreference},
    toast_success,
};
use image_effect::OutputFormat;
use slint::ComponentHandle;

pub const HISTORY_LIMIT_RANGE: (u32, u32) = (1, 50);
pub const BLUR_RADIUS_RANGE: (f32, f32) = (0.5, 50.0);

impl From<config::Editor> for UISettingEditor {
    fn from(editor: config::Editor) -> Self {
        Self {
            history_limit: editor.history_limit as i32,
            blur_radius: editor.blur_radius,
            batch_suffix: editor.batch_suffix.into(),
        }
    }
}

/// Clamps user input into ranges the editor can work with.
fn sanitize_editor(setting: UISettingEditor, mut editor: config::Editor) -> config::Editor {
    editor.history_limit =
        (setting.history_limit.max(0) as u32).clamp(HISTORY_LIMIT_RANGE.0, HISTORY_LIMIT_RANGE.1);

    editor.blur_radius = if setting.blur_radius.is_finite() {
        setting.blur_radius.clamp(BLUR_RADIUS_RANGE.0, BLUR_RADIUS_RANGE.1)
    } else {
        config::Editor::default().blur_radius
    };

    let suffix = setting.batch_suffix.trim();
    editor.batch_suffix = if suffix.is_empty() || suffix.contains(['/', '\\']) {
        config::Editor::default().batch_suffix
    } else {
        suffix.to_string()
    };

    editor
}

fn init_setting(ui: &AppWindow) {
    let config = config::all();

    let preference = SettingPreference {
        win_width: slint::format!("{}", u32::max(config.preference.win_width, 900)),
        win_height: slint::format!("{}", u32::max(config.preference.win_height, 700)),
        font_size: slint::format!("{}", config.preference.font_size),
        language: config.preference.language.into(),
        is_dark: config.preference.is_dark,
    };

    global_store!(ui).set_setting_preference(preference);
    global_store!(ui).set_setting_editor(config.editor.clone().into());

    let format_index = OutputFormat::from_name(&config.editor.output_format).unwrap_or_default();
    global_store!(ui).set_output_format_index(u8::from(format_index) as i32);
}

pub fn init(ui: &AppWindow) {
    init_setting(ui);

    global_store!(ui).set_is_first_run(config::all().is_first_run);

    global_logic!(ui).on_inner_tr(move |text, _lang| tr(text.as_str()).into());

    let ui_weak = ui.as_weak();
    global_logic!(ui).on_get_setting_preference(move || {
        let ui = ui_weak.unwrap();
        global_store!(ui).get_setting_preference()
    });

    let ui_weak = ui.as_weak();
    global_logic!(ui).on_set_setting_preference(move |mut setting| {
        let ui = ui_weak.unwrap();

        let font_size = u32::min(50, u32::max(10, setting.font_size.parse().unwrap_or(16)));
        setting.font_size = slint::format!("{}", font_size);

        let mut all = config::all();
        all.preference.win_width =
            u32::max(900, setting.win_width.to_string().parse().unwrap_or(1000));
        all.preference.win_height =
            u32::max(700, setting.win_height.to_string().parse().unwrap_or(750));
        all.preference.font_size = font_size;
        all.preference.language = setting.language.to_string();
        all.preference.is_dark = setting.is_dark;
        _ = config::save(all);

        global_store!(ui).set_setting_preference(setting);

        if !ui.window().is_maximized() {
            ui.global::<crate::Util>().invoke_update_window_size();
        }

        toast_success!(ui, tr("save configuration successfully"));
    });

    global_logic!(ui).on_get_setting_editor(move || config::all().editor.into());

    let ui_weak = ui.as_weak();
    global_logic!(ui).on_set_setting_editor(move |setting| {
        let ui = ui_weak.unwrap();

        let mut all = config::all();
        all.editor = sanitize_editor(setting, all.editor);
        editor::set_history_limit(all.editor.history_limit as usize);
        global_store!(ui).set_setting_editor(all.editor.clone().into());
        _ = config::save(all);

        toast_success!(ui, tr("save configuration successfully"));
    });

    global_logic!(ui).on_set_output_format(move |index| {
        let Ok(format) = OutputFormat::try_from(index.clamp(0, u8::MAX as i32) as u8) else {
            return;
        };

        let mut all = config::all();
        all.editor.output_format = format.name().to_string();
        _ = config::save(all);
    });
}
