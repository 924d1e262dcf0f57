use std::path::PathBuf;

use reqwest::Url;

use super::models::{AlbumScope, HOST};
use crate::base_system::context::{Config, safe_fs_name};

pub fn album_folder_name(grouping_id: &str, prefix_host: bool) -> String {
    let name = if prefix_host {
        format!("{}_{}", HOST, grouping_id)
    } else {
        grouping_id.to_string()
    };
    safe_fs_name(&name, "_", 120)
}

pub fn album_folder_path(config: &Config, scope: &AlbumScope) -> PathBuf {
    config.default_save_dir().join(album_folder_name(
        &scope.grouping_id(),
        config.folder_prefix_host,
    ))
}

/// 取 URL 最后一段路径作为文件名。
pub fn media_file_name(url: &Url) -> String {
    let last = url
        .path_segments()
        .and_then(|segs| segs.rev().find(|s| !s.is_empty()))
        .unwrap_or("media");
    safe_fs_name(last, "_", 150)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_names() {
        assert_eq!(
            album_folder_name("example_tag_art+cats", true),
            "tumblr_example_tag_art+cats"
        );
        assert_eq!(album_folder_name("example", false), "example");
        assert_eq!(album_folder_name("a%20b", false), "a%20b");
    }

    #[test]
    fn folder_path_under_save_dir() {
        let cfg = Config {
            save_path: "/data/rips".into(),
            ..Config::default()
        };
        let scope = AlbumScope::Post {
            blog: "example".into(),
            post_id: "1".into(),
        };
        assert_eq!(
            album_folder_path(&cfg, &scope),
            PathBuf::from("/data/rips").join("tumblr_example_post_1")
        );
    }

    #[test]
    fn file_names_from_urls() {
        let url = Url::parse("http://media.tumblr.com/abc/tumblr_xyz_1280.jpg?x=1").unwrap();
        assert_eq!(media_file_name(&url), "tumblr_xyz_1280.jpg");
        let url = Url::parse("http://vt.tumblr.com/clip.mp4/").unwrap();
        assert_eq!(media_file_name(&url), "clip.mp4");
        let url = Url::parse("http://vt.tumblr.com/").unwrap();
        assert_eq!(media_file_name(&url), "media");
    }
}
