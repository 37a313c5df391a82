mod common;

use std::sync::Arc;

use common::{
	ChannelContextPort, ChannelCoordinatorPort, DuplexLauncher, IDENTITY, RecordingNotifier, eventually, recv,
};
use serde_json::json;
use textern::protocol::{ContentMessage, ContextId, Envelope, LocalId};
use textern::{ConnectionState, Document, LogNotifier, PageContext, Registration, SessionRegistry};
use tokio::sync::mpsc;

fn registration(context: &str, text: &str) -> Registration {
	Registration::new(ContextId::new(context), LocalId::new(0), text)
		.caret(text.chars().count())
		.url("example.com/page")
}

#[tokio::test]
async fn helper_update_reaches_originating_context() {
	let launcher = Arc::new(DuplexLauncher::default());
	let (to_pages, mut page_rx) = mpsc::unbounded_channel();
	let registry = SessionRegistry::builder(IDENTITY, launcher.clone(), Arc::new(ChannelContextPort(to_pages))).build();

	let id = registry.register_session(registration("C", "hello")).await.unwrap();
	assert_eq!(id.to_string(), "C_0");

	let mut helper = launcher.take_helper();
	let request = helper.next_request().await;
	assert_eq!(request["type"], "new_text");
	assert_eq!(request["payload"]["id"], "C_0");
	assert_eq!(request["payload"]["text"], "hello");
	assert_eq!(request["payload"]["caret"], 5);
	assert_eq!(request["payload"]["url"], "example.com/page");
	assert_eq!(request["payload"]["prefs"]["editor"], r#"["gedit"]"#);

	helper
		.reply(json!({"type": "text_update", "payload": {"id": "C_0", "text": "hello world"}}))
		.await;

	let delivered = recv(&mut page_rx).await;
	assert_eq!(
		delivered,
		Envelope::new(
			IDENTITY,
			ContextId::new("C"),
			ContentMessage::SetText {
				local_id: LocalId::new(0),
				text: "hello world".into()
			}
		)
	);
}

#[tokio::test]
async fn helper_crash_ends_all_sessions() {
	let launcher = Arc::new(DuplexLauncher::default());
	let (to_pages, _page_rx) = mpsc::unbounded_channel();
	let notifier = Arc::new(RecordingNotifier::default());
	let registry = SessionRegistry::builder(IDENTITY, launcher.clone(), Arc::new(ChannelContextPort(to_pages)))
		.notifier(notifier.clone())
		.build();

	registry.register_session(registration("A", "one")).await.unwrap();
	registry.register_session(registration("B", "two")).await.unwrap();
	assert_eq!(registry.sessions().len(), 2);

	let mut helper = launcher.take_helper();
	helper.next_request().await;
	helper.next_request().await;
	helper.hang_up().await;

	eventually(|| registry.connection_state() == ConnectionState::Closed).await;
	assert!(registry.sessions().is_empty());
	assert!(notifier.0.lock().is_empty());

	// The coordinator keeps working with a fresh connection.
	registry.register_session(registration("A", "again")).await.unwrap();
	assert_eq!(registry.connection_state(), ConnectionState::Open);
}

#[tokio::test]
async fn death_notice_closes_connection() {
	let launcher = Arc::new(DuplexLauncher::default());
	let (to_pages, _page_rx) = mpsc::unbounded_channel();
	let registry = SessionRegistry::builder(IDENTITY, launcher.clone(), Arc::new(ChannelContextPort(to_pages))).build();

	registry.register_session(registration("C", "bye")).await.unwrap();
	let mut helper = launcher.take_helper();
	helper.next_request().await;
	helper
		.reply(json!({"type": "death_notice", "payload": {"id": "C_0"}}))
		.await;

	eventually(|| registry.connection_state() == ConnectionState::Closed).await;
	assert!(registry.sessions().is_empty());
}

#[tokio::test]
async fn page_and_coordinator_round_trip() {
	let launcher = Arc::new(DuplexLauncher::default());
	let (to_pages, mut page_rx) = mpsc::unbounded_channel();
	let (to_coordinator, mut coordinator_rx) = mpsc::unbounded_channel();
	let registry = SessionRegistry::builder(IDENTITY, launcher.clone(), Arc::new(ChannelContextPort(to_pages))).build();

	let mut doc = Document::new("https://mail.google.com/mail/u/0/#inbox?compose=new").unwrap();
	let composer = doc.append_element(doc.body(), "div");
	doc.set_attribute(composer, "contenteditable", "true");
	doc.set_attribute(composer, "g_editable", "true");
	doc.set_inner_html(composer, "<div>Dear&nbsp;team,</div><div><br></div><div>thanks</div>")
		.unwrap();
	doc.focus(composer);
	let mut page = PageContext::new(
		IDENTITY,
		ContextId::new("12"),
		doc,
		Arc::new(ChannelCoordinatorPort(to_coordinator)),
		Arc::new(LogNotifier),
	);

	let local = page.begin_editing().await.unwrap();
	let request = recv(&mut coordinator_rx).await;
	let id = registry.handle_content(request).await.unwrap().unwrap();
	assert_eq!(id.to_string(), "12_0");
	assert_eq!(local, LocalId::new(0));

	let mut helper = launcher.take_helper();
	let new_text = helper.next_request().await;
	assert_eq!(new_text["payload"]["text"], "Dear team,\n\nthanks");
	assert_eq!(new_text["payload"]["url"], "mail.google.com/mail/u/0/");

	helper
		.reply(json!({"type": "text_update", "payload": {"id": "12_0", "text": "Dear  team,\n\nthanks!"}}))
		.await;
	let update = recv(&mut page_rx).await;
	page.handle_message(update).await.unwrap();

	let handle = page.tracker().get(local).unwrap();
	assert_eq!(textern::adapter::get_text(page.document(), handle), "Dear  team,\n\nthanks!");
}

#[tokio::test]
async fn coordinator_owned_shortcut_starts_registration() {
	let launcher = Arc::new(DuplexLauncher::default());
	let (to_pages, mut page_rx) = mpsc::unbounded_channel();
	let (to_coordinator, mut coordinator_rx) = mpsc::unbounded_channel();
	let registry = SessionRegistry::builder(IDENTITY, launcher.clone(), Arc::new(ChannelContextPort(to_pages))).build();

	let mut doc = Document::new("https://example.com/form").unwrap();
	let field = doc.append_element(doc.body(), "input");
	doc.set_value(field, "draft");
	doc.focus(field);
	let mut page = PageContext::new(
		IDENTITY,
		ContextId::new("3"),
		doc,
		Arc::new(ChannelCoordinatorPort(to_coordinator)),
		Arc::new(LogNotifier),
	);

	registry.trigger_shortcut(ContextId::new("3")).await.unwrap();
	page.handle_message(recv(&mut page_rx).await).await.unwrap();
	let id = registry
		.handle_content(recv(&mut coordinator_rx).await)
		.await
		.unwrap();

	assert_eq!(id.map(|id| id.to_string()).as_deref(), Some("3_0"));
	assert!(registry.is_live(&"3_0".parse().unwrap()));
}
