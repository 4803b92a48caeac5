use jukeshare_server::error::ResolveError;
use jukeshare_server::resolver::{parse_song_info, parse_stream_url, Resolver, YoutubeDl};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_video() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg",
            "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "duration": 212
        }"#;

        let song = parse_song_info(json, "https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(song.title, "Never Gonna Give You Up");
        assert_eq!(
            song.thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
        );
        assert_eq!(song.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_parse_search_takes_first_entry() {
        let json = r#"{
            "_type": "playlist",
            "title": "rick astley",
            "entries": [
                {"title": "First Hit", "webpage_url": "https://example.com/first"},
                {"title": "Second Hit", "webpage_url": "https://example.com/second"}
            ]
        }"#;

        let song = parse_song_info(json, "rick astley").unwrap();
        assert_eq!(song.title, "First Hit");
        assert_eq!(song.thumbnail_url, None);
        assert_eq!(song.url, "https://example.com/first");
    }

    #[test]
    fn test_parse_empty_search() {
        let json = r#"{"_type": "playlist", "title": "zzzz", "entries": []}"#;
        assert!(matches!(
            parse_song_info(json, "zzzz"),
            Err(ResolveError::NoResult(query)) if query == "zzzz"
        ));
    }

    #[test]
    fn test_parse_falls_back_to_query_url() {
        let json = r#"{"title": "direct upload"}"#;
        let song = parse_song_info(json, "https://files.example.com/a.mp3").unwrap();
        assert_eq!(song.url, "https://files.example.com/a.mp3");
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_song_info("ERROR: not json", "q"),
            Err(ResolveError::Parse(_))
        ));
        assert!(matches!(
            parse_song_info(r#"{"thumbnail": "x"}"#, "q"),
            Err(ResolveError::NoResult(_))
        ));
    }

    #[test]
    fn test_parse_stream_url() {
        let stdout = "\n  https://rr1.googlevideo.com/videoplayback?id=1  \nhttps://second\n";
        assert_eq!(
            parse_stream_url(stdout, "q").unwrap(),
            "https://rr1.googlevideo.com/videoplayback?id=1"
        );
        assert!(matches!(
            parse_stream_url("\n \n", "https://example.com/v"),
            Err(ResolveError::NoResult(url)) if url == "https://example.com/v"
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_spawn_error() {
        let resolver = YoutubeDl::new("/nonexistent/jukeshare-youtube-dl");
        assert!(matches!(
            resolver.song_info("anything").await,
            Err(ResolveError::Spawn(_))
        ));
    }
}
