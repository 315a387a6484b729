use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

pub struct RoomCounters {
    pub created: IntCounter,
    pub deleted: IntCounter,
    pub handoffs: IntCounter,
    pub rejected_creations: IntCounter,
    pub active: IntGauge,
}

pub struct BotStats {
    pub registry: Registry,
    pub voice_events: IntCounter,
    pub rooms: RoomCounters,
    pub controls: IntCounterVec,
    pub authority_failures: IntCounterVec,
}

impl BotStats {
    #[must_use]
    pub fn new() -> Self {
        let voice_events = IntCounter::with_opts(Opts::new(
            "voice_events",
            "Voice channel transitions received from discord",
        ))
        .unwrap();
        let created =
            IntCounter::with_opts(Opts::new("rooms_created", "Voice rooms created")).unwrap();
        let deleted =
            IntCounter::with_opts(Opts::new("rooms_deleted", "Voice rooms torn down")).unwrap();
        let handoffs = IntCounter::with_opts(Opts::new(
            "room_handoffs",
            "Ownership transfers after the owner left",
        ))
        .unwrap();
        let rejected_creations = IntCounter::with_opts(Opts::new(
            "rooms_rejected",
            "Room creations refused by the cooldown",
        ))
        .unwrap();
        let active = IntGauge::with_opts(Opts::new("rooms_active", "Rooms alive in this process"))
            .unwrap();
        let controls =
            IntCounterVec::new(Opts::new("room_controls", "Executed room controls"), &["name"])
                .unwrap();
        let authority_failures = IntCounterVec::new(
            Opts::new("authority_failures", "Failed calls to the remote authority"),
            &["kind"],
        )
        .unwrap();

        let registry = Registry::new_custom(Some("tempvoice".into()), None).unwrap();
        registry.register(Box::new(voice_events.clone())).unwrap();
        registry.register(Box::new(created.clone())).unwrap();
        registry.register(Box::new(deleted.clone())).unwrap();
        registry.register(Box::new(handoffs.clone())).unwrap();
        registry.register(Box::new(rejected_creations.clone())).unwrap();
        registry.register(Box::new(active.clone())).unwrap();
        registry.register(Box::new(controls.clone())).unwrap();
        registry
            .register(Box::new(authority_failures.clone()))
            .unwrap();

        BotStats {
            registry,
            voice_events,
            rooms: RoomCounters {
                created,
                deleted,
                handoffs,
                rejected_creations,
                active,
            },
            controls,
            authority_failures,
        }
    }
}

impl Default for BotStats {
    fn default() -> Self {
        Self::new()
    }
}
