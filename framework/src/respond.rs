use tempvoice_models::discord::{
    application::interaction::Interaction,
    channel::message::{Embed, MessageFlags},
    http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
    id::{
        marker::{ApplicationMarker, InteractionMarker},
        Id,
    },
};
use twilight_http::Client as Http;
use twilight_validate::message::{
    content as _content, embeds as _embeds, MessageValidationError,
};

use crate::error::PlatformError;

/// Answers an interaction with a message only the invoker can see
pub struct Responder<'a> {
    http: &'a Http,
    application_id: Id<ApplicationMarker>,
    interaction_id: Id<InteractionMarker>,
    token: &'a str,
    content: Option<&'a str>,
    embeds: Option<&'a [Embed]>,
}

impl<'a> Responder<'a> {
    pub fn new(
        http: &'a Http,
        application_id: Id<ApplicationMarker>,
        interaction: &'a Interaction,
    ) -> Self {
        Self {
            http,
            application_id,
            interaction_id: interaction.id,
            token: &interaction.token,
            content: None,
            embeds: None,
        }
    }

    pub fn content(mut self, content: &'a str) -> Result<Self, MessageValidationError> {
        _content(content)?;

        self.content = Some(content);
        Ok(self)
    }

    pub fn embeds(mut self, embeds: &'a [Embed]) -> Result<Self, MessageValidationError> {
        _embeds(embeds)?;

        self.embeds = Some(embeds);
        Ok(self)
    }

    pub async fn exec(self) -> Result<(), PlatformError> {
        let response = InteractionResponse {
            kind: InteractionResponseType::ChannelMessageWithSource,
            data: Some(InteractionResponseData {
                content: self.content.map(ToString::to_string),
                embeds: self.embeds.map(<[Embed]>::to_vec),
                flags: Some(MessageFlags::EPHEMERAL),
                ..InteractionResponseData::default()
            }),
        };
        self.http
            .interaction(self.application_id)
            .create_response(self.interaction_id, self.token, &response)
            .await?;
        Ok(())
    }
}
