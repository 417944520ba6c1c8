use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::config::{CacheBust, LoaderConfig, Upstream};

pub const GAMES_URL: &str = "https://games.roblox.com/v1/games";
pub const ICONS_URL: &str = "https://thumbnails.roblox.com/v1/games/icons";
pub const PLAY_URL_BASE: &str = "https://www.roblox.com/games/";
pub const DISCOVER_URL: &str = "https://www.roblox.com/discover#/";

const CACHE_BUST_PARAM: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUrls {
    pub games: String,
    pub icons: String,
}

pub fn cache_bust_token(config: &LoaderConfig, now_millis: i64) -> String {
    match config.cache_bust {
        CacheBust::Timestamp => now_millis.to_string(),
        CacheBust::Build => config.build_tag.clone(),
    }
}

pub fn build_urls(
    config: &LoaderConfig,
    ids: &[String],
    bust: &str,
) -> Result<RequestUrls, url::ParseError> {
    let joined = ids.join(",");

    let (mut games, mut icons) = match &config.upstream {
        Upstream::Proxy { base } => (
            Url::parse(&format!("{base}/games"))?,
            Url::parse(&format!("{base}/icons"))?,
        ),
        Upstream::Direct => (Url::parse(GAMES_URL)?, Url::parse(ICONS_URL)?),
    };

    games
        .query_pairs_mut()
        .append_pair("universeIds", &joined)
        .append_pair(CACHE_BUST_PARAM, bust);

    {
        let mut query = icons.query_pairs_mut();
        query.append_pair("universeIds", &joined);
        if config.upstream == Upstream::Direct {
            query
                .append_pair("size", "512x512")
                .append_pair("format", "Png")
                .append_pair("isCircular", "false");
        }
        query.append_pair(CACHE_BUST_PARAM, bust);
    }

    Ok(RequestUrls {
        games: games.into(),
        icons: icons.into(),
    })
}

/// Deep link for a listing; listings without a root place go to discovery.
pub fn play_url(root_place_id: Option<&str>) -> String {
    match root_place_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => {
            let encoded: String = byte_serialize(id.as_bytes()).collect();
            format!("{PLAY_URL_BASE}{encoded}")
        }
        None => DISCOVER_URL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<String> {
        vec!["1".to_string(), "2".to_string()]
    }

    #[test]
    fn direct_urls_hit_upstream_with_thumbnail_params() {
        let config = LoaderConfig::new(ids());
        let urls = build_urls(&config, &config.universe_ids, "123").unwrap();
        assert_eq!(
            urls.games,
            "https://games.roblox.com/v1/games?universeIds=1%2C2&_=123"
        );
        assert_eq!(
            urls.icons,
            "https://thumbnails.roblox.com/v1/games/icons?universeIds=1%2C2&size=512x512&format=Png&isCircular=false&_=123"
        );
    }

    #[test]
    fn proxy_urls_use_configured_base() {
        let config = LoaderConfig::new(ids()).with_proxy("http://localhost:8787/api/roblox");
        let urls = build_urls(&config, &config.universe_ids, "v9").unwrap();
        assert_eq!(
            urls.games,
            "http://localhost:8787/api/roblox/games?universeIds=1%2C2&_=v9"
        );
        assert_eq!(
            urls.icons,
            "http://localhost:8787/api/roblox/icons?universeIds=1%2C2&_=v9"
        );
    }

    #[test]
    fn cache_bust_follows_mode() {
        let mut config = LoaderConfig::new(ids()).with_build_tag("b42");
        assert_eq!(cache_bust_token(&config, 1_700), "1700");
        config.cache_bust = CacheBust::Build;
        assert_eq!(cache_bust_token(&config, 1_700), "b42");
    }

    #[test]
    fn play_url_falls_back_to_discovery() {
        assert_eq!(play_url(Some("606849621")), "https://www.roblox.com/games/606849621");
        assert_eq!(play_url(Some("  ")), DISCOVER_URL);
        assert_eq!(play_url(None), DISCOVER_URL);
    }
}
