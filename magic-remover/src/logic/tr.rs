use crate::config;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static TRANSLATIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Magical Background Remover", "魔法背景移除器"),
        ("Ready", "就绪"),
        ("Upload Image", "上传图片"),
        ("Remove Background", "移除背景"),
        ("Batch Process", "批量处理"),
        ("Effects & Tools", "效果与工具"),
        ("Magic Touch", "魔法美化"),
        ("Blur", "模糊"),
        ("Sharpen", "锐化"),
        ("Grayscale", "灰度"),
        ("Replace BG Color", "替换背景颜色"),
        ("Replace BG Image", "替换背景图片"),
        ("Undo", "撤销"),
        ("Save Output", "保存结果"),
        ("Format", "格式"),
        ("Settings", "设置"),
        ("Help", "帮助"),
        ("Close", "关闭"),
        ("Apply", "应用"),
        ("Cancel", "取消"),
        ("Cancel download?", "取消下载？"),
        ("Confirm", "确认"),
        ("Input Image", "输入图片"),
        ("Output Image", "输出图片"),
        ("Press F1 for Help", "按 F1 查看帮助"),
        ("Drag & Drop Image Here\nor Click Upload", "拖放图片到这里\n或点击上传"),
        ("Click Upload to open an image", "点击上传以打开图片"),
        ("Processed image will appear here", "处理后的图片将显示在这里"),
        ("Select an Image", "选择一张图片"),
        ("Select Images", "选择图片"),
        ("Select Background Image", "选择背景图片"),
        ("Select Output Directory", "选择输出目录"),
        ("Select Model Directory", "选择模型目录"),
        ("Save Image", "保存图片"),
        ("Image Files", "图片文件"),
        ("Loaded", "已加载"),
        ("Error loading image", "加载图片失败"),
        ("Upload an image first!", "请先上传图片！"),
        ("Process an image first!", "请先处理图片！"),
        ("Remove the background first!", "请先移除背景！"),
        ("No output to save!", "没有可保存的图片！"),
        (
            "Please wait for current operation to complete",
            "请等待当前操作完成",
        ),
        ("Removing background...", "正在移除背景..."),
        ("Background removed successfully!", "背景移除成功！"),
        ("Failed to remove background", "移除背景失败"),
        ("Applying magic touch...", "正在施展魔法..."),
        ("Magic applied!", "魔法已生效！"),
        (
            "Your image has been magically enhanced!",
            "你的图片已被魔法增强！",
        ),
        ("Applying effect...", "正在应用效果..."),
        ("Blur effect applied", "已应用模糊效果"),
        ("Sharpen effect applied", "已应用锐化效果"),
        ("Grayscale effect applied", "已应用灰度效果"),
        ("Magic failed", "魔法美化失败"),
        ("Effect failed", "效果应用失败"),
        ("Replacing background...", "正在替换背景..."),
        ("Background replaced with", "背景已替换为"),
        ("Background replaced with image", "背景已替换为图片"),
        ("Invalid color", "无效的颜色"),
        ("Choose Background Color", "选择背景颜色"),
        ("Undo successful", "撤销成功"),
        ("Nothing to undo", "没有可撤销的操作"),
        ("Saving...", "正在保存..."),
        ("Saved to", "已保存到"),
        ("Saved successfully to", "成功保存到"),
        ("Save failed", "保存失败"),
        ("Processing", "正在处理"),
        ("Processed", "已处理"),
        ("images", "张图片"),
        ("Batch processing complete! Saved to", "批量处理完成！已保存到"),
        ("Processed images successfully", "图片处理成功"),
        ("failed", "失败"),
        ("Batch processing failed", "批量处理失败"),
        ("Choose file failed", "选择文件失败"),
        ("Choose directory failed", "选择目录失败"),
        ("Reason", "原因"),
        ("Preference", "偏好"),
        ("Editor", "编辑器"),
        ("Models", "模型"),
        ("Window width", "窗口宽度"),
        ("Window height", "窗口高度"),
        ("Font size", "字体大小"),
        ("Language", "语言"),
        ("Dark mode", "深色模式"),
        ("Undo steps", "撤销步数"),
        ("Blur radius", "模糊半径"),
        ("Batch file suffix", "批量文件后缀"),
        ("Model directory", "模型目录"),
        ("Browse", "浏览"),
        ("Download", "下载"),
        ("Use", "使用"),
        ("In use", "使用中"),
        ("Not downloaded", "未下载"),
        ("Downloaded", "已下载"),
        ("Downloading", "正在下载"),
        ("Download cancelled", "下载已取消"),
        ("Download incompleted", "下载不完整"),
        ("Download completed", "下载完成"),
        ("Download failed", "下载失败"),
        ("Load model failed", "加载模型失败"),
        (
            "Model file not found, download it in Settings",
            "找不到模型文件，请在设置中下载",
        ),
        ("save configuration successfully", "保存配置成功"),
        ("Quit while a task is running?", "任务正在运行，确定退出吗？"),
        ("Quit", "退出"),
        ("Keyboard Shortcuts", "快捷键"),
        ("Effects", "效果"),
        ("Replace Background", "替换背景"),
        ("Drag & Drop", "拖放"),
        ("Supported Formats", "支持的格式"),
        ("Input", "输入"),
        ("Output", "输出"),
        ("Features", "功能"),
        ("Open image", "打开图片"),
        ("Save output", "保存结果"),
        ("Undo last edit", "撤销上一步"),
        ("Show this help", "显示帮助"),
        ("Quit application", "退出程序"),
        ("Cut the subject out with an AI model", "使用 AI 模型抠出主体"),
        (
            "Enhance the cutout and add a soft gradient backdrop",
            "增强抠图并添加柔和渐变背景",
        ),
        (
            "Blur, sharpen or grayscale the current output",
            "对当前结果进行模糊、锐化或灰度处理",
        ),
        (
            "Put the cutout on a solid color or another image",
            "将抠图放在纯色或其他图片上",
        ),
        (
            "Remove the background of many images at once",
            "一次移除多张图片的背景",
        ),
        ("Drop an image file onto the window to open it", "将图片拖放到窗口即可打开"),
    ])
});

/// Looks `text` up for `language`. Untranslated text is returned as is.
pub fn translate(text: &str, language: &str) -> String {
    if language != "cn" {
        return text.to_string();
    }

    TRANSLATIONS.get(text).unwrap_or(&text).to_string()
}

pub fn tr(text: &str) -> String {
    translate(text, &config::all().preference.language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate() {
        assert_eq!(translate("Undo", "en"), "Undo");
        assert_eq!(translate("Undo", "cn"), "撤销");
        assert_eq!(translate("no such text", "cn"), "no such text");
    }

    #[test]
    fn test_translations_keep_line_breaks() {
        for (key, value) in TRANSLATIONS.iter() {
            assert!(!value.is_empty(), "{key}");
            assert_eq!(key.matches('\n').count(), value.matches('\n').count(), "{key}");
        }
    }

    #[test]
    fn test_editor_messages_are_translated() {
        for key in [
            "Magic failed",
            "No output to save!",
            "Click Upload to open an image",
            "Supported Formats",
            "Drag & Drop",
        ] {
            assert!(TRANSLATIONS.contains_key(key), "{key}");
            assert_ne!(translate(key, "cn"), key);
        }

        assert!(!TRANSLATIONS.contains_key("No image to save!"));
    }
}
