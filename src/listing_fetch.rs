use serde_json::Value;

use crate::endpoints::RequestUrls;
use crate::error::FetchResult;
use crate::http_client::Transport;
use crate::listing::{Listing, Thumbnail};
use crate::retry::{RetryPolicy, Sleeper};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedListings {
    pub listings: Vec<Listing>,
    pub thumbnails: Vec<Thumbnail>,
}

/// Fetches both endpoints concurrently. Either one failing fails the pair,
/// but only after both have settled.
pub fn fetch_listings(
    transport: &dyn Transport,
    sleeper: &dyn Sleeper,
    policy: &RetryPolicy,
    urls: &RequestUrls,
) -> FetchResult<FetchedListings> {
    let (games, icons) = rayon::join(
        || fetch_body(transport, sleeper, policy, &urls.games),
        || fetch_body(transport, sleeper, policy, &urls.icons),
    );
    let listings = parse_games_json(&games?)?;
    let thumbnails = parse_icons_json(&icons?)?;
    Ok(FetchedListings {
        listings,
        thumbnails,
    })
}

fn fetch_body(
    transport: &dyn Transport,
    sleeper: &dyn Sleeper,
    policy: &RetryPolicy,
    url: &str,
) -> FetchResult<String> {
    policy.run(sleeper, |_, timeout| transport.get(url, timeout))
}

pub fn parse_games_json(raw: &str) -> FetchResult<Vec<Listing>> {
    let Some(root) = parse_root(raw)? else {
        return Ok(Vec::new());
    };
    Ok(data_entries(&root)
        .iter()
        .filter_map(|entry| {
            let id = id_string(entry.get("id"))?;
            Some(Listing {
                id,
                name: entry
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                playing: count_value(entry.get("playing")),
                visits: count_value(entry.get("visits")),
                root_place_id: id_string(entry.get("rootPlaceId")),
            })
        })
        .collect())
}

pub fn parse_icons_json(raw: &str) -> FetchResult<Vec<Thumbnail>> {
    let Some(root) = parse_root(raw)? else {
        return Ok(Vec::new());
    };
    Ok(data_entries(&root)
        .iter()
        .filter_map(|entry| {
            let id = id_string(entry.get("targetId"))
                .or_else(|| id_string(entry.get("universeId")))?;
            let image_url = non_empty_str(entry.get("imageUrl")).or_else(|| {
                entry
                    .get("thumbnails")
                    .and_then(Value::as_array)
                    .and_then(|thumbs| {
                        thumbs
                            .iter()
                            .find_map(|t| non_empty_str(t.get("imageUrl")))
                    })
            });
            Some(Thumbnail { id, image_url })
        })
        .collect())
}

fn parse_root(raw: &str) -> FetchResult<Option<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let root: Value = serde_json::from_str(trimmed)?;
    Ok(Some(root))
}

fn data_entries(root: &Value) -> &[Value] {
    root.get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn count_value(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
