use crate::models::{Status, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotPublic,
    Reblog,
    Reply,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NotPublic => "not public",
            SkipReason::Reblog => "is a boost",
            SkipReason::Reply => "is a reply",
        }
    }
}

/// Why a status should not be boosted, or `None` when it should.
pub fn skip_reason(status: &Status) -> Option<SkipReason> {
    if status.visibility != Visibility::Public {
        Some(SkipReason::NotPublic)
    } else if status.reblog.is_some() {
        Some(SkipReason::Reblog)
    } else if status.in_reply_to_id.is_some() || status.in_reply_to_account_id.is_some() {
        Some(SkipReason::Reply)
    } else {
        None
    }
}

/// Only original, public, top-level posts get boosted.
pub fn is_eligible(status: &Status) -> bool {
    skip_reason(status).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatusId;

    #[test]
    fn plain_public_post_is_eligible() {
        assert!(is_eligible(&Status::public("1")));
    }

    #[test]
    fn non_public_visibilities_are_skipped() {
        for visibility in [
            Visibility::Unlisted,
            Visibility::Private,
            Visibility::Direct,
            Visibility::Unknown("local".into()),
        ] {
            let mut status = Status::public("1");
            status.visibility = visibility;
            assert_eq!(skip_reason(&status), Some(SkipReason::NotPublic));
        }
    }

    #[test]
    fn boosts_are_skipped() {
        let mut status = Status::public("2");
        status.reblog = Some(Box::new(Status::public("1")));
        assert!(!is_eligible(&status));
        assert_eq!(skip_reason(&status), Some(SkipReason::Reblog));
    }

    #[test]
    fn replies_are_skipped_by_either_marker() {
        let mut to_post = Status::public("3");
        to_post.in_reply_to_id = Some(StatusId::from("1"));
        assert_eq!(skip_reason(&to_post), Some(SkipReason::Reply));

        let mut to_account = Status::public("4");
        to_account.in_reply_to_account_id = Some("77".into());
        assert_eq!(skip_reason(&to_account), Some(SkipReason::Reply));
    }
}
