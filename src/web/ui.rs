const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// 渲染页面：上传表单 + 标注结果列表
pub fn render_page(processed_images: &[String], failed_files: &[String]) -> String {
    let images: String = processed_images
        .iter()
        // URL由output_url生成，文件名部分已做百分号编码
        .map(|url| {
            format!(
                "<figure><a href=\"{url}\"><img src=\"{url}\" alt=\"Processed image\"></a></figure>\n"
            )
        })
        .collect();

    let failed = if failed_files.is_empty() {
        String::new()
    } else {
        let items: String = failed_files
            .iter()
            .map(|name| format!("<li>{}</li>", ammonia::clean_text(name)))
            .collect();
        format!("<div class=\"failed\"><p>Could not read these images:</p><ul>{items}</ul></div>")
    };

    INDEX_TEMPLATE
        .replace("{{failed_files}}", &failed)
        .replace("{{processed_images}}", &images)
}
