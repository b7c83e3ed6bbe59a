use crate::{
    commands::{command_utils::check_arity, CommandError},
    pub_sub::PubSub,
    resp::RespValue,
};

pub struct PublishArguments {
    channel: String,
    message: String,
}

impl PublishArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("PUBLISH", arguments, 2, Some(2))?;

        Ok(Self {
            channel: arguments[0].clone(),
            message: arguments[1].clone(),
        })
    }
}

/// Replies with the number of subscribers the message was pushed to.
pub fn publish(pub_sub: &mut PubSub, arguments: &[String]) -> Result<RespValue, CommandError> {
    let publish_arguments = PublishArguments::parse(arguments)?;

    let receivers = pub_sub.publish(&publish_arguments.channel, &publish_arguments.message);

    Ok(RespValue::Integer(receivers as i64))
}
