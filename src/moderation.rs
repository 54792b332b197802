use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, UserId};

/// A moderator's verdict, carried in the callback payload of a decision
/// keyboard button.
///
/// Wire format is colon-delimited ASCII: `accept:<senderId>:<messageId>`,
/// `reject:<senderId>:<messageId>`, `block:<senderId>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept {
        user_id: UserId,
        message_id: MessageId,
    },
    Reject {
        user_id: UserId,
        message_id: MessageId,
    },
    Block {
        user_id: UserId,
    },
}

impl Decision {
    pub fn encode(&self) -> String {
        match self {
            Self::Accept {
                user_id,
                message_id,
            } => format!("accept:{}:{}", user_id.0, message_id.0),
            Self::Reject {
                user_id,
                message_id,
            } => format!("reject:{}:{}", user_id.0, message_id.0),
            Self::Block { user_id } => format!("block:{}", user_id.0),
        }
    }

    /// Parse a callback payload. Returns None for unknown tags, wrong
    /// arity, or non-numeric fields.
    pub fn parse(payload: &str) -> Option<Self> {
        let mut parts = payload.split(':');
        let tag = parts.next()?;

        let decision = match tag {
            "accept" | "reject" => {
                let user_id = UserId(parts.next()?.parse().ok()?);
                let message_id = MessageId(parts.next()?.parse().ok()?);
                if tag == "accept" {
                    Self::Accept {
                        user_id,
                        message_id,
                    }
                } else {
                    Self::Reject {
                        user_id,
                        message_id,
                    }
                }
            }
            "block" => Self::Block {
                user_id: UserId(parts.next()?.parse().ok()?),
            },
            _ => return None,
        };

        if parts.next().is_some() {
            return None;
        }
        Some(decision)
    }
}

/// One-row Accept / Reject / Block keyboard attached to every forwarded
/// submission.
pub fn decision_keyboard(user_id: UserId, message_id: MessageId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[
        InlineKeyboardButton::callback(
            "Принять",
            Decision::Accept {
                user_id,
                message_id,
            }
            .encode(),
        ),
        InlineKeyboardButton::callback(
            "Отклонить",
            Decision::Reject {
                user_id,
                message_id,
            }
            .encode(),
        ),
        InlineKeyboardButton::callback("Блокировать", Decision::Block { user_id }.encode()),
    ]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_accept() {
        let decision = Decision::Accept {
            user_id: UserId(123),
            message_id: MessageId(45),
        };
        assert_eq!(decision.encode(), "accept:123:45");
    }

    #[test]
    fn test_encode_block_has_no_message_id() {
        assert_eq!(Decision::Block { user_id: UserId(7) }.encode(), "block:7");
    }

    #[test]
    fn test_parse_roundtrip() {
        for decision in [
            Decision::Accept {
                user_id: UserId(123),
                message_id: MessageId(45),
            },
            Decision::Reject {
                user_id: UserId(1),
                message_id: MessageId(2),
            },
            Decision::Block { user_id: UserId(9) },
        ] {
            assert_eq!(Decision::parse(&decision.encode()), Some(decision));
        }
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        for payload in [
            "",
            "accept",
            "accept:123",
            "accept:123:45:6",
            "accept:abc:45",
            "block:",
            "block:1:2",
            "promote:1:2",
        ] {
            assert_eq!(Decision::parse(payload), None, "payload: {payload:?}");
        }
    }

    #[test]
    fn test_keyboard_payloads_match_key() {
        let keyboard = decision_keyboard(UserId(55), MessageId(77));
        let row = &keyboard.inline_keyboard[0];
        assert_eq!(row.len(), 3);

        let payloads: Vec<_> = row
            .iter()
            .map(|button| match &button.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => data.clone(),
                other => panic!("unexpected button kind: {other:?}"),
            })
            .collect();
        assert_eq!(payloads, ["accept:55:77", "reject:55:77", "block:55"]);
    }
}
