pub mod lobby;
pub mod voice;

use tempvoice_framework::prelude::*;
use tempvoice_models::{
    discord::{
        application::interaction::{
            application_command::{CommandData, CommandDataOption, CommandOptionValue},
            Interaction, InteractionData,
        },
        channel::message::Embed,
        id::{marker::ApplicationMarker, Id},
    },
    room::VoiceRoomLobbyPatch,
};
use twilight_http::Client as Http;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

use lobby::LobbySettings;
use voice::RoomPanel;

/// A parsed `/voice` or `/lobby` invocation
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Control {
    Rename(String),
    Lock,
    Limit(i64),
    Reclaim,
    Close,
    LobbySetup {
        channel_id: ChannelId,
        settings: LobbySettings,
    },
    LobbyEdit {
        channel_id: ChannelId,
        user_limit: Option<i64>,
        patch: VoiceRoomLobbyPatch,
    },
    LobbyRemove {
        channel_id: ChannelId,
    },
}

enum Outcome {
    Panel(RoomPanel),
    Text(String),
}

fn string(options: &[CommandDataOption], name: &str) -> Option<String> {
    options.iter().find(|o| o.name == name).and_then(|o| match &o.value {
        CommandOptionValue::String(s) => Some(s.clone()),
        _ => None,
    })
}

fn integer(options: &[CommandDataOption], name: &str) -> Option<i64> {
    options.iter().find(|o| o.name == name).and_then(|o| match o.value {
        CommandOptionValue::Integer(i) => Some(i),
        _ => None,
    })
}

fn boolean(options: &[CommandDataOption], name: &str) -> Option<bool> {
    options.iter().find(|o| o.name == name).and_then(|o| match o.value {
        CommandOptionValue::Boolean(b) => Some(b),
        _ => None,
    })
}

fn channel(options: &[CommandDataOption], name: &str) -> Option<ChannelId> {
    options.iter().find(|o| o.name == name).and_then(|o| match o.value {
        CommandOptionValue::Channel(c) => Some(ChannelId(c)),
        _ => None,
    })
}

impl Control {
    pub fn parse(data: &CommandData) -> Option<Self> {
        let (sub, options) = data.options.iter().find_map(|o| match &o.value {
            CommandOptionValue::SubCommand(options) => Some((o.name.as_str(), options.as_slice())),
            _ => None,
        })?;

        let control = match (data.name.as_str(), sub) {
            ("voice", "rename") => Control::Rename(string(options, "name")?),
            ("voice", "lock") => Control::Lock,
            ("voice", "limit") => Control::Limit(integer(options, "limit")?),
            ("voice", "reclaim") => Control::Reclaim,
            ("voice", "close") => Control::Close,
            ("lobby", "setup") => {
                let defaults = LobbySettings::default();
                Control::LobbySetup {
                    channel_id: channel(options, "channel")?,
                    settings: LobbySettings {
                        user_limit: integer(options, "limit").unwrap_or(defaults.user_limit),
                        can_rename: boolean(options, "rename").unwrap_or(defaults.can_rename),
                        can_lock: boolean(options, "lock").unwrap_or(defaults.can_lock),
                        can_adjust_limit: boolean(options, "adjust_limit")
                            .unwrap_or(defaults.can_adjust_limit),
                    },
                }
            }
            ("lobby", "edit") => Control::LobbyEdit {
                channel_id: channel(options, "channel")?,
                user_limit: integer(options, "limit"),
                patch: VoiceRoomLobbyPatch {
                    user_limit: None,
                    can_rename: boolean(options, "rename"),
                    can_lock: boolean(options, "lock"),
                    can_adjust_limit: boolean(options, "adjust_limit"),
                },
            },
            ("lobby", "remove") => Control::LobbyRemove {
                channel_id: channel(options, "channel")?,
            },
            _ => return None,
        };
        Some(control)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Control::Rename(_) => "rename",
            Control::Lock => "lock",
            Control::Limit(_) => "limit",
            Control::Reclaim => "reclaim",
            Control::Close => "close",
            Control::LobbySetup { .. } => "lobby setup",
            Control::LobbyEdit { .. } => "lobby edit",
            Control::LobbyRemove { .. } => "lobby remove",
        }
    }
}

async fn execute(
    bot: &BotContext,
    guild_id: GuildId,
    invoker: UserId,
    control: Control,
) -> Result<Outcome, RoomError> {
    let outcome = match control {
        Control::Rename(name) => Outcome::Panel(voice::rename(bot, guild_id, invoker, &name).await?),
        Control::Lock => Outcome::Panel(voice::toggle_lock(bot, guild_id, invoker).await?),
        Control::Limit(limit) => Outcome::Panel(voice::set_limit(bot, guild_id, invoker, limit).await?),
        Control::Reclaim => Outcome::Panel(voice::reclaim(bot, guild_id, invoker).await?),
        Control::Close => {
            voice::close(bot, guild_id, invoker).await?;
            Outcome::Text("Your room has been closed.".into())
        }
        Control::LobbySetup {
            channel_id,
            settings,
        } => {
            let lobby = lobby::setup(bot, guild_id, channel_id, settings).await?;
            Outcome::Text(format!(
                "<#{}> is now a lobby. Rooms opened from it hold up to {} members.",
                lobby.channel_id, lobby.user_limit
            ))
        }
        Control::LobbyEdit {
            channel_id,
            user_limit,
            patch,
        } => {
            let lobby = lobby::edit(bot, guild_id, channel_id, user_limit, patch).await?;
            Outcome::Text(format!(
                "Updated <#{}>: limit {}, rename {}, lock {}, adjust limit {}.",
                lobby.channel_id,
                lobby.user_limit,
                lobby.can_rename,
                lobby.can_lock,
                lobby.can_adjust_limit
            ))
        }
        Control::LobbyRemove { channel_id } => {
            lobby::remove(bot, guild_id, channel_id).await?;
            Outcome::Text(format!("<#{}> is no longer a lobby.", channel_id))
        }
    };
    Ok(outcome)
}

pub fn panel_embed(panel: &RoomPanel) -> Embed {
    let (state, color) = if panel.is_locked {
        ("Locked", Color::Red)
    } else {
        ("Unlocked", Color::Green)
    };
    EmbedBuilder::new()
        .default_data()
        .color(color as u32)
        .title(panel.name.clone().unwrap_or_else(|| "Voice Room".into()))
        .field(EmbedFieldBuilder::new("Owner", format!("<@{}>", panel.owner_id)).inline())
        .field(EmbedFieldBuilder::new("Creator", format!("<@{}>", panel.creator_id)).inline())
        .field(EmbedFieldBuilder::new("State", state).inline())
        .field(EmbedFieldBuilder::new("Member Limit", panel.user_limit.to_string()).inline())
        .build()
}

/// Run the control an interaction asks for and answer the invoker
pub async fn handle_interaction(
    bot: &BotContext,
    http: &Http,
    application_id: Id<ApplicationMarker>,
    interaction: &Interaction,
) -> Result<(), PlatformError> {
    let control = match &interaction.data {
        Some(InteractionData::ApplicationCommand(data)) => Control::parse(data),
        _ => None,
    };
    let (control, guild_id, invoker) = match (control, interaction.guild_id, interaction.author_id()) {
        (Some(control), Some(guild_id), Some(invoker)) => (control, GuildId(guild_id), UserId(invoker)),
        _ => return Ok(()),
    };

    let name = control.name();
    let responder = Responder::new(http, application_id, interaction);
    match execute(bot, guild_id, invoker, control).await {
        Ok(Outcome::Panel(panel)) => {
            let embeds = [panel_embed(&panel)];
            responder.embeds(&embeds)?.exec().await
        }
        Ok(Outcome::Text(text)) => responder.content(&text)?.exec().await,
        Err(err) => {
            match &err {
                RoomError::Rejected(_) => {
                    tracing::debug!(control = name, guild = %guild_id, user = %invoker, err = %err, "Control rejected");
                }
                _ => {
                    tracing::error!(control = name, guild = %guild_id, user = %invoker, err = ?err, "Control failed");
                }
            }
            if let RoomError::Resource(ResourceError::Transport(_)) = &err {
                bot.stats.authority_failures.with_label_values(&["transport"]).inc();
            }
            let message = err.user_message();
            responder.content(&message)?.exec().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempvoice_models::discord::application::command::CommandType;

    fn option(name: &str, value: CommandOptionValue) -> CommandDataOption {
        CommandDataOption {
            name: name.into(),
            value,
        }
    }

    fn command(name: &str, sub: &str, options: Vec<CommandDataOption>) -> CommandData {
        CommandData {
            guild_id: None,
            id: Id::new(1),
            kind: CommandType::ChatInput,
            name: name.into(),
            options: vec![option(sub, CommandOptionValue::SubCommand(options))],
            resolved: None,
            target_id: None,
        }
    }

    #[test]
    fn voice_subcommands() {
        let data = command(
            "voice",
            "rename",
            vec![option("name", CommandOptionValue::String("Chill".into()))],
        );
        assert_eq!(Control::parse(&data), Some(Control::Rename("Chill".into())));

        let data = command(
            "voice",
            "limit",
            vec![option("limit", CommandOptionValue::Integer(4))],
        );
        assert_eq!(Control::parse(&data), Some(Control::Limit(4)));

        assert_eq!(Control::parse(&command("voice", "lock", vec![])), Some(Control::Lock));
        assert_eq!(Control::parse(&command("voice", "limit", vec![])), None);
        assert_eq!(Control::parse(&command("voice", "dance", vec![])), None);
    }

    #[test]
    fn lobby_setup_fills_in_defaults() {
        let data = command(
            "lobby",
            "setup",
            vec![
                option("channel", CommandOptionValue::Channel(Id::new(10))),
                option("lock", CommandOptionValue::Boolean(false)),
            ],
        );
        let expected = Control::LobbySetup {
            channel_id: ChannelId::new(10),
            settings: LobbySettings {
                can_lock: false,
                ..LobbySettings::default()
            },
        };
        assert_eq!(Control::parse(&data), Some(expected));
    }

    #[test]
    fn panels_render_every_field() {
        let panel = RoomPanel {
            channel_id: ChannelId::new(20),
            name: Some("Nia's room".into()),
            owner_id: UserId::new(3),
            creator_id: UserId::new(3),
            is_locked: true,
            user_limit: 1,
        };
        let embed = panel_embed(&panel);
        assert_eq!(embed.title.as_deref(), Some("Nia's room"));
        assert_eq!(embed.fields.len(), 4);
        assert_eq!(embed.fields[2].value, "Locked");
        assert_eq!(embed.color, Some(Color::Red as u32));
    }
}
