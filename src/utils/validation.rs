/// 允许上传的图像扩展名
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// 标注输出文件名前缀
pub const ANNOTATED_PREFIX: &str = "annotated_";

/// 检查文件扩展名是否在允许列表中（只看最后一个点之后的部分，不区分大小写）
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// 将客户端文件名规整为存储名：只保留最后一个路径分量，其余字符原样保留
///
/// 同名上传映射到同一存储名，后一次上传覆盖前一次。
pub fn storage_name(filename: &str) -> Option<String> {
    let name = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// 标注结果文件名
pub fn annotated_name(name: &str) -> String {
    format!("{}{}", ANNOTATED_PREFIX, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_extensions_case_insensitively() {
        assert!(allowed_file("photo.JPG"));
        assert!(allowed_file("photo.jpeg"));
        assert!(allowed_file("scan.Png"));
    }

    #[test]
    fn rejects_other_or_missing_extensions() {
        assert!(!allowed_file("doc.pdf"));
        assert!(!allowed_file("noext"));
        assert!(!allowed_file("archive.png.zip"));
        assert!(!allowed_file("trailing."));
    }

    #[test]
    fn only_final_extension_matters() {
        assert!(allowed_file("a.b.png"));
        assert!(allowed_file(".png"));
    }

    #[test]
    fn storage_name_strips_directories() {
        assert_eq!(storage_name("cat.png").as_deref(), Some("cat.png"));
        assert_eq!(storage_name("../../etc/cat.png").as_deref(), Some("cat.png"));
        assert_eq!(storage_name("C:\\Users\\me\\dog.jpg").as_deref(), Some("dog.jpg"));
        assert_eq!(storage_name("dir/"), None);
        assert_eq!(storage_name(".."), None);
        assert_eq!(storage_name(""), None);
    }

    #[test]
    fn storage_name_keeps_surrounding_whitespace() {
        let name = storage_name("uploads/photo.png ").unwrap();
        assert_eq!(name, "photo.png ");
        assert!(!allowed_file(&name));
    }

    #[test]
    fn annotated_name_adds_prefix() {
        assert_eq!(annotated_name("a.b.png"), "annotated_a.b.png");
    }
}
