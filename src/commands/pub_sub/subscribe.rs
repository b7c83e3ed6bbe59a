use crate::{
    commands::{command_utils::check_arity, CommandError},
    pub_sub::PubSub,
    resp::RespValue,
    session::Session,
};

/// Subscribes the session to every given channel.
///
/// One `["subscribe", channel, count]` reply is produced per channel, where
/// `count` is the number of channels the session is subscribed to afterwards.
pub fn subscribe(
    session: &mut Session,
    pub_sub: &mut PubSub,
    arguments: &[String],
) -> Result<Vec<RespValue>, CommandError> {
    check_arity("SUBSCRIBE", arguments, 1, None)?;

    Ok(arguments
        .iter()
        .map(|channel| {
            pub_sub.subscribe(channel, session.id(), session.outbox().clone());
            let count = session.subscribe(channel);

            confirmation("subscribe", Some(channel), count)
        })
        .collect())
}

/// Without arguments every current subscription is dropped. A session with
/// nothing to leave gets a single `["unsubscribe", null, 0]`.
pub fn unsubscribe(
    session: &mut Session,
    pub_sub: &mut PubSub,
    arguments: &[String],
) -> Result<Vec<RespValue>, CommandError> {
    let channels = if arguments.is_empty() {
        session.subscriptions().to_vec()
    } else {
        arguments.to_vec()
    };

    if channels.is_empty() {
        return Ok(vec![confirmation("unsubscribe", None, 0)]);
    }

    Ok(channels
        .iter()
        .map(|channel| {
            pub_sub.unsubscribe(channel, session.id());
            let count = session.unsubscribe(channel);

            confirmation("unsubscribe", Some(channel), count)
        })
        .collect())
}

fn confirmation(kind: &str, channel: Option<&String>, count: usize) -> RespValue {
    RespValue::Array(vec![
        RespValue::BulkString(kind.to_string()),
        channel.map_or(RespValue::NullBulkString, |channel| {
            RespValue::BulkString(channel.clone())
        }),
        RespValue::Integer(count as i64),
    ])
}
