//! Rendering of new items into outgoing messages, per subscription options.
//!
//! Three shapes: a user-supplied template (one plain message per item), an
//! embed per item, or bare links batched a few per message. Filters
//! (`shorts`, `only_new`) are applied here because they are per-subscription,
//! unlike staleness/dedup which are per-account.

use feedrelay_core::{render_template, FeedItem, Platform, Subscription, TrackedAccount};
use feedrelay_discord::{Embed, EmbedAuthor, EmbedFooter, EmbedImage, OutboundMessage};

const EMBED_TITLE_MAX: usize = 256;

/// Items from an account's to-announce set this subscription wants.
#[must_use]
pub fn subscription_items<'a>(
    subscription: &Subscription,
    items: &'a [FeedItem],
) -> Vec<&'a FeedItem> {
    items
        .iter()
        .filter(|item| {
            if item.is_short && !subscription.shorts {
                return false;
            }
            if subscription.only_new && item.created_at < subscription.created_at {
                return false;
            }
            true
        })
        .collect()
}

/// Render this subscription's messages for the given items.
///
/// `plain_batch_size` bounds how many links share one message in plain mode.
#[must_use]
pub fn render_messages(
    subscription: &Subscription,
    account: &TrackedAccount,
    items: &[&FeedItem],
    plain_batch_size: usize,
) -> Vec<OutboundMessage> {
    if items.is_empty() {
        return Vec::new();
    }

    if let Some(template) = &subscription.template {
        return items
            .iter()
            .map(|item| OutboundMessage::text(fill_template(template, account, item)))
            .collect();
    }

    if subscription.embeds {
        return items
            .iter()
            .map(|item| OutboundMessage::embed(render_embed(account, item)))
            .collect();
    }

    items
        .chunks(plain_batch_size.max(1))
        .map(|chunk| {
            let links: Vec<&str> = chunk.iter().map(|item| item.url.as_str()).collect();
            OutboundMessage::text(links.join("\n"))
        })
        .collect()
}

fn fill_template(template: &str, account: &TrackedAccount, item: &FeedItem) -> String {
    let timestamp = item.created_at.to_rfc3339();
    let author_url = account_url(account);
    let image = item.image_url.as_deref().unwrap_or_default();
    render_template(
        template,
        &[
            ("title", item.title.as_str()),
            ("url", item.url.as_str()),
            ("author", item.author.as_str()),
            ("author.url", author_url.as_str()),
            ("image", image),
            ("timestamp", timestamp.as_str()),
        ],
    )
}

fn render_embed(account: &TrackedAccount, item: &FeedItem) -> Embed {
    let mut title = item.title.clone();
    if title.is_empty() {
        title = item.url.clone();
    } else if title.chars().count() > EMBED_TITLE_MAX {
        title = title.chars().take(EMBED_TITLE_MAX - 1).collect::<String>() + "…";
    }

    Embed {
        title: Some(title),
        url: Some(item.url.clone()),
        description: None,
        color: Some(platform_color(account.platform)),
        timestamp: Some(item.created_at),
        author: Some(EmbedAuthor {
            name: item.author.clone(),
            url: Some(account_url(account)),
        }),
        image: item.image_url.clone().map(|url| EmbedImage { url }),
        footer: Some(EmbedFooter {
            text: platform_label(account.platform).to_string(),
        }),
    }
}

/// Public profile URL for the tracked account.
fn account_url(account: &TrackedAccount) -> String {
    match account.platform {
        Platform::Pinterest => format!("https://www.pinterest.com/{}/", account.display_name),
        Platform::Twitter => format!("https://x.com/{}", account.display_name),
        Platform::Youtube => {
            format!("https://www.youtube.com/channel/{}", account.external_id)
        }
        Platform::Soundcloud => format!("https://soundcloud.com/{}", account.display_name),
    }
}

fn platform_color(platform: Platform) -> u32 {
    match platform {
        Platform::Pinterest => 0x00E6_0023,
        Platform::Twitter => 0x001D_A1F2,
        Platform::Youtube => 0x00FF_0000,
        Platform::Soundcloud => 0x00FF_5500,
    }
}

fn platform_label(platform: Platform) -> &'static str {
    match platform {
        Platform::Pinterest => "Pinterest",
        Platform::Twitter => "Twitter",
        Platform::Youtube => "YouTube",
        Platform::Soundcloud => "SoundCloud",
    }
}
