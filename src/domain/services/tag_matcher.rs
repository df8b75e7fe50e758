//! Proxy tag and autoproxy matching.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::entities::{AutoproxyMode, LastMessage, MessageContext, ProxyMember, ProxyTag};
use crate::domain::value_objects::Snowflake;

/// Prefix that opts a single message out of autoproxy.
pub const AUTOPROXY_ESCAPE: char = '\\';

/// How a member was selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSource {
    /// The message was wrapped in one of the member's tags
    Tag(ProxyTag),
    /// No tag matched; the autoproxy mode chose the member
    Autoproxy(AutoproxyMode),
}

/// Result of matching: who speaks, and what they say.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyMatch {
    pub member: ProxyMember,
    /// Content to send
    pub content: String,
    pub source: MatchSource,
}

impl ProxyMatch {
    pub fn is_autoproxy(&self) -> bool {
        matches!(self.source, MatchSource::Autoproxy(_))
    }
}

/// Strip `tag` from `content`, returning the trimmed inner text.
///
/// Prefix and suffix may not overlap. An empty inner text only matches when
/// the message carries an attachment.
pub fn strip_tag<'a>(content: &'a str, tag: &ProxyTag, has_attachment: bool) -> Option<&'a str> {
    let (prefix, suffix) = (tag.prefix(), tag.suffix());

    if content.len() >= tag.total_len() && content.starts_with(prefix) && content.ends_with(suffix)
    {
        let inner = content.get(prefix.len()..content.len() - suffix.len())?.trim();
        return (!inner.is_empty() || has_attachment).then_some(inner);
    }

    // "A: " sent with only an image arrives as "A:"
    if has_attachment {
        let bare = format!("{}{}", prefix.trim(), suffix.trim());
        if !bare.is_empty() && content.trim() == bare {
            return Some("");
        }
    }

    None
}

/// Selects the member a message is proxied as.
#[derive(Debug, Clone, Default)]
pub struct ProxyMatcher {
    latch_timeout: Option<Duration>,
}

impl ProxyMatcher {
    /// `latch_timeout` of `None` means latches never expire.
    pub fn new(latch_timeout: Option<Duration>) -> Self {
        Self { latch_timeout }
    }

    /// Match `content` against the candidates' tags, then autoproxy.
    ///
    /// The longest prefix+suffix wins; equal lengths go to the earlier
    /// member, then the earlier tag.
    pub fn try_match(
        &self,
        ctx: &MessageContext,
        members: &[ProxyMember],
        content: &str,
        has_attachment: bool,
        allow_autoproxy: bool,
        now: DateTime<Utc>,
    ) -> Option<ProxyMatch> {
        if let Some(found) = Self::match_tags(members, content, has_attachment) {
            return Some(found);
        }
        if !allow_autoproxy {
            return None;
        }
        self.match_autoproxy(ctx, members, content, now)
    }

    fn match_tags(members: &[ProxyMember], content: &str, has_attachment: bool) -> Option<ProxyMatch> {
        let content = content.trim();

        let mut candidates: Vec<(&ProxyMember, &ProxyTag)> = members
            .iter()
            .flat_map(|member| member.proxy_tags.iter().map(move |tag| (member, tag)))
            .collect();
        // stable: ties keep registration order
        candidates.sort_by(|a, b| b.1.total_len().cmp(&a.1.total_len()));

        candidates.into_iter().find_map(|(member, tag)| {
            let inner = strip_tag(content, tag, has_attachment)?;
            let sent = if member.keep_proxy { content } else { inner };
            Some(ProxyMatch {
                member: member.clone(),
                content: sent.to_string(),
                source: MatchSource::Tag(tag.clone()),
            })
        })
    }

    fn match_autoproxy(
        &self,
        ctx: &MessageContext,
        members: &[ProxyMember],
        content: &str,
        now: DateTime<Utc>,
    ) -> Option<ProxyMatch> {
        if content.starts_with(AUTOPROXY_ESCAPE) {
            return None;
        }

        let member_id = match ctx.autoproxy_mode {
            AutoproxyMode::Off => return None,
            AutoproxyMode::Front => *ctx.fronters.first()?,
            AutoproxyMode::Latch => {
                let last = ctx.last_message?;
                if self.latch_expired(&last, now) {
                    return None;
                }
                last.member_id
            }
            AutoproxyMode::Member(id) => id,
        };

        let member = members.iter().find(|m| m.id == member_id)?;
        if !member.allow_autoproxy {
            return None;
        }

        Some(ProxyMatch {
            member: member.clone(),
            content: content.to_string(),
            source: MatchSource::Autoproxy(ctx.autoproxy_mode),
        })
    }

    fn latch_expired(&self, last: &LastMessage, now: DateTime<Utc>) -> bool {
        let Some(timeout) = self.latch_timeout else {
            return false;
        };
        let age = Snowflake::new(last.message_id).age_at(now);
        age.to_std().map(|age| age > timeout).unwrap_or(false)
    }
}
