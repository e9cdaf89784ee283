use proto::{DispatchState, Model, ProviderReply, Role, SessionEvent, Turn};

#[test]
fn transcript_turns_round_trip_through_json_contract() {
    let history = vec![
        Turn::user("Hello"),
        Turn::assistant("Hi there\nHow can I help?"),
        Turn::system_error("System Error: Failed to connect to backend."),
    ];

    let serialized = serde_json::to_string(&history).expect("serialize history");
    assert!(serialized.contains("\"role\":\"user\""));
    assert!(serialized.contains("\"role\":\"system-error\""));

    let parsed: Vec<Turn> = serde_json::from_str(&serialized).expect("deserialize history");
    assert_eq!(parsed, history);
    assert_eq!(parsed[1].role, Role::Assistant);
    assert_eq!(parsed[1].content, "Hi there\nHow can I help?");
}

#[test]
fn directory_payload_decodes_in_server_order() {
    let body = r#"[
        {"id":"m1","name":"Alpha","icon":"a"},
        {"id":"m2","name":"Beta","icon":"b","provider":"Acme"}
    ]"#;
    let models: Vec<Model> = serde_json::from_str(body).expect("decode directory");

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].id, "m1");
    assert_eq!(models[1].id, "m2");
    assert_eq!(models[1].provider.as_deref(), Some("Acme"));
}

#[test]
fn provider_reply_body_classification_contract() {
    let text: ProviderReply = serde_json::json!("plain").into();
    assert_eq!(text, ProviderReply::Text("plain".to_string()));

    let message: ProviderReply = serde_json::json!({"message": {"content": "x"}}).into();
    assert_eq!(message, ProviderReply::Message("x".to_string()));

    let opaque: ProviderReply = serde_json::json!({"foo": 1}).into();
    assert!(matches!(opaque, ProviderReply::Opaque(_)));
}

#[test]
fn session_events_carry_snapshots() {
    let model = Model::new("m1", "Alpha", "a");
    let events = vec![
        SessionEvent::CatalogLoaded {
            models: vec![model.clone()],
        },
        SessionEvent::ModelChanged {
            model: model.clone(),
        },
        SessionEvent::PendingChanged { pending: true },
        SessionEvent::PendingChanged { pending: false },
        SessionEvent::HistoryCleared,
    ];

    assert_eq!(events.len(), 5);
    assert_eq!(events[1], SessionEvent::ModelChanged { model });
    assert!(!DispatchState::default().is_pending());
}
