//! Top-level chat controller.
//!
//! Owns the UI state the original page kept in ambient globals (session
//! token, pending image, loading flag) and exposes one handler per user
//! action. Handlers talk to the backend through [`ChatBackend`] and to the
//! display through [`ChatView`], so both sides can be faked in tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tutorchat_core::error::ChatClientError;
use tutorchat_core::image::{self, ImageAttachment};
use tutorchat_core::quiz::QuestionRecord;
use tutorchat_core::session::{ChatMessage, ChatMode};
use tutorchat_interaction::{BotReply, ChatBackend};

use crate::render::{self, DiagramRenderer, PanelDiagramRenderer};
use crate::view::{ChatView, MessageBody, RenderedMessage};

/// Shown when the request fails before reaching the service.
const MSG_NETWORK_ERROR: &str = "网络错误，请检查连接。";
/// Shown for any other failure the user cannot act on.
const MSG_REQUEST_FAILED: &str = "抱歉，处理您的请求时出错，请稍后重试。";
/// Appended after a dialogue session is closed.
const MSG_DIALOGUE_ENDED: &str = "（对话已结束，您可以开始新的对话）";
/// Alert when a selected image file cannot be read.
const MSG_IMAGE_UNREADABLE: &str = "无法读取图片文件！";
/// Alert when revealing a card that has nothing to show.
const MSG_NO_DETAIL: &str = "该题没有可显示的解析。";

/// Mutable UI state, owned by the controller.
#[derive(Debug, Default)]
pub struct UiState {
    /// Which endpoint family sends go to.
    pub mode: ChatMode,
    /// Session token from the dialogue endpoints; absent until the first
    /// successful start.
    pub session_id: Option<String>,
    /// Image staged for the next send.
    pub selected_image: Option<ImageAttachment>,
    /// True while a request is in flight; sends are no-ops meanwhile.
    pub in_flight: bool,
}

/// Drives one conversation.
pub struct ChatController<V: ChatView> {
    view: V,
    backend: Arc<dyn ChatBackend>,
    diagrams: Box<dyn DiagramRenderer>,
    state: UiState,
    /// Records of the most recent quiz reply, for the reveal toggle.
    latest_quiz: Vec<QuestionRecord>,
    revealed: HashSet<usize>,
}

impl<V: ChatView> ChatController<V> {
    /// Creates a controller. Registers diagram extensions once up front so
    /// render time never deals with registration.
    pub fn new(view: V, backend: Arc<dyn ChatBackend>, mode: ChatMode) -> Self {
        render::ensure_mindmap_registered();
        Self {
            view,
            backend,
            diagrams: Box::new(PanelDiagramRenderer),
            state: UiState {
                mode,
                ..UiState::default()
            },
            latest_quiz: Vec::new(),
            revealed: HashSet::new(),
        }
    }

    /// Current UI state, read-only.
    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Sends the trimmed input to the mode-appropriate endpoint and renders
    /// the reply. Empty input and sends while a request is in flight are
    /// no-ops.
    pub async fn handle_send(&mut self, input: &str) {
        let text = input.trim();
        if text.is_empty() {
            return;
        }
        if self.state.in_flight {
            return;
        }

        let image = self.state.selected_image.take();
        let user_message = ChatMessage::user(text, image.clone());
        self.view
            .append(&render::render_message(&user_message, self.diagrams.as_ref()));

        self.state.in_flight = true;
        self.view.set_loading(true);

        let result = match self.state.mode {
            ChatMode::Chat => self.backend.chat(text, image.as_ref()).await,
            ChatMode::Dialogue => match self.state.session_id.clone() {
                Some(session_id) => self.backend.continue_dialogue(&session_id, text).await,
                None => self.backend.start_dialogue(text).await,
            },
        };

        match result {
            Ok(reply) => self.show_reply(reply),
            Err(err) => {
                tracing::error!("[ChatController] request failed: {}", err);
                let bubble = ChatMessage::assistant(error_bubble_text(&err));
                self.view
                    .append(&render::render_message(&bubble, self.diagrams.as_ref()));
            }
        }

        self.state.in_flight = false;
        self.view.set_loading(false);
    }

    fn show_reply(&mut self, reply: BotReply) {
        if let Some(session_id) = reply.session_id.clone() {
            self.state.session_id = Some(session_id);
        }
        if let Some(header) = dialogue_header(&reply) {
            self.view.append(&render::render_message(
                &ChatMessage::system(header),
                self.diagrams.as_ref(),
            ));
        }

        let bubble = ChatMessage::assistant(&reply.response);
        let rendered = render::render_message(&bubble, self.diagrams.as_ref());
        if let MessageBody::QuizCards(cards) = &rendered.body {
            self.latest_quiz = cards.iter().map(|c| c.record.clone()).collect();
            self.revealed.clear();
        }
        self.view.append(&rendered);
    }

    /// Stages an image for the next send after validating it.
    ///
    /// Oversized files are rejected from metadata alone, without reading the
    /// content. Any rejection alerts the user and leaves no image staged.
    pub async fn handle_image_selected(&mut self, path: &Path) {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let attachment = async {
            if image::mime_for_file(&file_name).is_none() {
                return Err(ChatClientError::invalid_image(image::MSG_NOT_AN_IMAGE));
            }
            let meta = tokio::fs::metadata(path)
                .await
                .map_err(|_| ChatClientError::invalid_image(MSG_IMAGE_UNREADABLE))?;
            image::check_image_size(meta.len())?;
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|_| ChatClientError::invalid_image(MSG_IMAGE_UNREADABLE))?;
            ImageAttachment::from_bytes(&file_name, &bytes)
        }
        .await;

        match attachment {
            Ok(attachment) => {
                self.view.append(&render::render_message(
                    &ChatMessage::system(format!("已选择图片：{}（{}）", file_name, attachment.mime)),
                    self.diagrams.as_ref(),
                ));
                self.state.selected_image = Some(attachment);
            }
            Err(err) => {
                tracing::warn!("[ChatController] image rejected: {}", err);
                self.state.selected_image = None;
                match err {
                    ChatClientError::InvalidImage(message) => self.view.alert(&message),
                    _ => self.view.alert(MSG_IMAGE_UNREADABLE),
                }
            }
        }
    }

    /// Drops the staged image without sending it.
    pub fn handle_clear_image(&mut self) {
        self.state.selected_image = None;
    }

    /// Restores the initial log and clears all conversation state.
    pub fn handle_reset(&mut self) {
        self.view.reset_log();
        self.clear_conversation_state();
    }

    /// Ends a dialogue session. The service notification is best-effort:
    /// failures are logged, local state is cleared either way.
    pub async fn handle_end(&mut self) {
        if self.state.in_flight {
            return;
        }
        let Some(session_id) = self.state.session_id.take() else {
            self.handle_reset();
            return;
        };

        self.view.set_loading(true);
        if let Err(err) = self.backend.end_dialogue(&session_id).await {
            tracing::warn!("[ChatController] end_dialogue failed (ignored): {}", err);
        }
        self.view.set_loading(false);

        self.view.reset_log();
        self.clear_conversation_state();
        self.view.append(&render::render_message(
            &ChatMessage::system(MSG_DIALOGUE_ENDED),
            self.diagrams.as_ref(),
        ));
    }

    /// Toggles the answer/explanation panel of one card in the most recent
    /// quiz. Purely local state, default hidden.
    pub fn handle_reveal(&mut self, index: usize) {
        let Some(record) = self.latest_quiz.get(index) else {
            self.view.alert(MSG_NO_DETAIL);
            return;
        };
        if !record.has_detail() {
            self.view.alert(MSG_NO_DETAIL);
            return;
        }

        if self.revealed.remove(&index) {
            self.view.append(&render::render_message(
                &ChatMessage::system(format!("（已隐藏第{}题解析）", index + 1)),
                self.diagrams.as_ref(),
            ));
        } else {
            self.revealed.insert(index);
            self.view.append(&RenderedMessage {
                role: tutorchat_core::session::MessageRole::Assistant,
                body: MessageBody::QuizDetail {
                    index,
                    answer: record.answer.clone(),
                    explanation: record.explanation.clone(),
                },
                image_mime: None,
                timestamp: tutorchat_core::session::message::now_timestamp(),
            });
        }
    }

    fn clear_conversation_state(&mut self) {
        self.state.session_id = None;
        self.state.selected_image = None;
        self.latest_quiz.clear();
        self.revealed.clear();
    }
}

/// Status line shown above dialogue replies that carry role-play metadata.
fn dialogue_header(reply: &BotReply) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(character) = &reply.character {
        parts.push(character.clone());
    }
    if let Some(topic) = &reply.topic {
        parts.push(format!("话题:{}", topic));
    }
    if let Some(turn) = reply.turn_count {
        parts.push(format!("第{}轮", turn));
    }
    if parts.is_empty() {
        None
    } else {
        Some(format!("【{}】", parts.join("｜")))
    }
}

fn error_bubble_text(err: &ChatClientError) -> String {
    match err {
        ChatClientError::Api { message, .. } => message.clone(),
        ChatClientError::Network { .. } => MSG_NETWORK_ERROR.to_string(),
        _ => MSG_REQUEST_FAILED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;
    use tutorchat_core::error::Result;
    use tutorchat_core::session::MessageRole;

    /// Records every view call.
    #[derive(Default)]
    struct FakeView {
        appended: Vec<RenderedMessage>,
        alerts: Vec<String>,
        loading_calls: Vec<bool>,
        resets: usize,
    }

    impl ChatView for FakeView {
        fn append(&mut self, message: &RenderedMessage) {
            self.appended.push(message.clone());
        }
        fn set_loading(&mut self, loading: bool) {
            self.loading_calls.push(loading);
        }
        fn alert(&mut self, text: &str) {
            self.alerts.push(text.to_string());
        }
        fn reset_log(&mut self) {
            self.resets += 1;
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Chat { message: String, has_image: bool },
        Start { message: String },
        Continue { session_id: String, message: String },
        End { session_id: String },
    }

    /// Scripted backend that records calls and pops queued results.
    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<Call>>,
        replies: Mutex<Vec<Result<BotReply>>>,
    }

    impl FakeBackend {
        fn push_reply(&self, reply: Result<BotReply>) {
            self.replies.lock().unwrap().push(reply);
        }

        fn pop_reply(&self) -> Result<BotReply> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Ok(BotReply {
                    response: "好的".to_string(),
                    ..BotReply::default()
                })
            } else {
                replies.remove(0)
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn chat(&self, message: &str, image: Option<&ImageAttachment>) -> Result<BotReply> {
            self.calls.lock().unwrap().push(Call::Chat {
                message: message.to_string(),
                has_image: image.is_some(),
            });
            self.pop_reply()
        }

        async fn start_dialogue(&self, message: &str) -> Result<BotReply> {
            self.calls.lock().unwrap().push(Call::Start {
                message: message.to_string(),
            });
            self.pop_reply()
        }

        async fn continue_dialogue(&self, session_id: &str, message: &str) -> Result<BotReply> {
            self.calls.lock().unwrap().push(Call::Continue {
                session_id: session_id.to_string(),
                message: message.to_string(),
            });
            self.pop_reply()
        }

        async fn end_dialogue(&self, session_id: &str) -> Result<()> {
            self.calls.lock().unwrap().push(Call::End {
                session_id: session_id.to_string(),
            });
            Ok(())
        }
    }

    fn controller(mode: ChatMode) -> (ChatController<FakeView>, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::default());
        let controller = ChatController::new(FakeView::default(), backend.clone(), mode);
        (controller, backend)
    }

    fn literal(body: &MessageBody) -> &str {
        match body {
            MessageBody::Literal(text) | MessageBody::Markdown(text) => text,
            other => panic!("expected text body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_appends_user_then_bot() {
        let (mut c, backend) = controller(ChatMode::Chat);
        c.handle_send("  你好  ").await;

        assert_eq!(backend.calls(), vec![Call::Chat {
            message: "你好".to_string(),
            has_image: false,
        }]);
        assert_eq!(c.view.appended.len(), 2);
        assert_eq!(c.view.appended[0].role, MessageRole::User);
        assert_eq!(literal(&c.view.appended[0].body), "你好");
        assert_eq!(c.view.appended[1].role, MessageRole::Assistant);
        assert_eq!(c.view.loading_calls, vec![true, false]);
        assert!(!c.state.in_flight);
    }

    #[tokio::test]
    async fn test_empty_input_is_a_noop() {
        let (mut c, backend) = controller(ChatMode::Chat);
        c.handle_send("   ").await;
        assert!(backend.calls().is_empty());
        assert!(c.view.appended.is_empty());
    }

    #[tokio::test]
    async fn test_send_while_in_flight_is_a_noop() {
        let (mut c, backend) = controller(ChatMode::Chat);
        c.state.in_flight = true;
        c.handle_send("第二条").await;
        assert!(backend.calls().is_empty());
        assert!(c.view.appended.is_empty());

        // Once the in-flight call settles, sends work again
        c.state.in_flight = false;
        c.handle_send("第二条").await;
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_api_error_message_becomes_bot_bubble() {
        let (mut c, backend) = controller(ChatMode::Chat);
        backend.push_reply(Err(ChatClientError::api(500, "oops")));
        c.handle_send("hi").await;

        let bubble = c.view.appended.last().unwrap();
        assert_eq!(bubble.role, MessageRole::Assistant);
        assert_eq!(literal(&bubble.body), "oops");
        // The UI is usable again
        assert!(!c.state.in_flight);
        assert_eq!(c.view.loading_calls, vec![true, false]);
    }

    #[tokio::test]
    async fn test_network_error_shows_localized_fallback() {
        let (mut c, backend) = controller(ChatMode::Chat);
        backend.push_reply(Err(ChatClientError::network("connection refused")));
        c.handle_send("hi").await;
        assert_eq!(literal(&c.view.appended.last().unwrap().body), MSG_NETWORK_ERROR);
    }

    #[tokio::test]
    async fn test_dialogue_start_stores_token_then_continues() {
        let (mut c, backend) = controller(ChatMode::Dialogue);
        backend.push_reply(Ok(BotReply {
            response: "让我们开始".to_string(),
            session_id: Some("s-1".to_string()),
            ..BotReply::default()
        }));

        c.handle_send("谈谈实践").await;
        assert_eq!(c.state.session_id.as_deref(), Some("s-1"));

        c.handle_send("继续").await;
        let calls = backend.calls();
        assert_eq!(calls[0], Call::Start {
            message: "谈谈实践".to_string(),
        });
        assert_eq!(calls[1], Call::Continue {
            session_id: "s-1".to_string(),
            message: "继续".to_string(),
        });
    }

    #[tokio::test]
    async fn test_end_clears_token_and_next_send_starts_again() {
        let (mut c, backend) = controller(ChatMode::Dialogue);
        backend.push_reply(Ok(BotReply {
            response: "开始".to_string(),
            session_id: Some("s-1".to_string()),
            ..BotReply::default()
        }));
        c.handle_send("开始吧").await;

        c.handle_end().await;
        assert_eq!(c.state.session_id, None);
        assert_eq!(c.view.resets, 1);
        let notice = c.view.appended.last().unwrap();
        assert_eq!(notice.role, MessageRole::System);
        assert_eq!(literal(&notice.body), MSG_DIALOGUE_ENDED);

        c.handle_send("新话题").await;
        let calls = backend.calls();
        assert_eq!(calls[1], Call::End {
            session_id: "s-1".to_string(),
        });
        assert!(matches!(calls[2], Call::Start { .. }));
    }

    #[tokio::test]
    async fn test_end_without_session_only_resets() {
        let (mut c, backend) = controller(ChatMode::Dialogue);
        c.handle_end().await;
        assert!(backend.calls().is_empty());
        assert_eq!(c.view.resets, 1);
        assert!(c.view.appended.is_empty());
    }

    #[tokio::test]
    async fn test_dialogue_header_is_shown() {
        let (mut c, backend) = controller(ChatMode::Dialogue);
        backend.push_reply(Ok(BotReply {
            response: "想一想".to_string(),
            session_id: Some("s-1".to_string()),
            character: Some("苏格拉底".to_string()),
            topic: Some("实践".to_string()),
            turn_count: Some(1),
        }));
        c.handle_send("开始").await;

        let header = &c.view.appended[1];
        assert_eq!(header.role, MessageRole::System);
        assert_eq!(literal(&header.body), "【苏格拉底｜话题:实践｜第1轮】");
    }

    #[tokio::test]
    async fn test_oversized_image_is_rejected_without_reading() {
        let (mut c, backend) = controller(ChatMode::Chat);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(20 * 1024 * 1024).unwrap();

        c.handle_image_selected(&path).await;
        assert!(c.state.selected_image.is_none());
        assert_eq!(c.view.alerts, vec![image::MSG_IMAGE_TOO_LARGE]);

        // No request payload ever includes an image
        c.handle_send("看看这张图").await;
        assert_eq!(backend.calls(), vec![Call::Chat {
            message: "看看这张图".to_string(),
            has_image: false,
        }]);
    }

    #[tokio::test]
    async fn test_non_image_file_is_rejected() {
        let (mut c, _backend) = controller(ChatMode::Chat);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"hello")
            .unwrap();

        c.handle_image_selected(&path).await;
        assert!(c.state.selected_image.is_none());
        assert_eq!(c.view.alerts, vec![image::MSG_NOT_AN_IMAGE]);
    }

    #[tokio::test]
    async fn test_image_is_sent_once_then_cleared() {
        let (mut c, backend) = controller(ChatMode::Chat);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[0x89, 0x50, 0x4e, 0x47])
            .unwrap();

        c.handle_image_selected(&path).await;
        assert!(c.state.selected_image.is_some());

        c.handle_send("这是什么").await;
        assert_eq!(backend.calls(), vec![Call::Chat {
            message: "这是什么".to_string(),
            has_image: true,
        }]);
        // Staged image is consumed by the send
        assert!(c.state.selected_image.is_none());

        c.handle_send("再问一次").await;
        assert_eq!(backend.calls()[1], Call::Chat {
            message: "再问一次".to_string(),
            has_image: false,
        });
    }

    #[tokio::test]
    async fn test_reset_restores_log_and_clears_state() {
        let (mut c, _backend) = controller(ChatMode::Dialogue);
        c.state.session_id = Some("s-1".to_string());
        c.handle_reset();
        assert_eq!(c.view.resets, 1);
        assert_eq!(c.state.session_id, None);
    }

    #[tokio::test]
    async fn test_reveal_toggles_detail() {
        let (mut c, backend) = controller(ChatMode::Chat);
        backend.push_reply(Ok(BotReply {
            response: "题目1：\n题干：2+2=?\nA. 3\nB. 4\n正确答案：B\n解析：基本算术".to_string(),
            ..BotReply::default()
        }));
        c.handle_send("出一道题").await;

        // Cards start hidden
        match &c.view.appended.last().unwrap().body {
            MessageBody::QuizCards(cards) => assert!(cards.iter().all(|card| !card.revealed)),
            other => panic!("expected quiz cards, got {:?}", other),
        }

        c.handle_reveal(0);
        match &c.view.appended.last().unwrap().body {
            MessageBody::QuizDetail { answer, explanation, .. } => {
                assert_eq!(answer, "B");
                assert_eq!(explanation, "基本算术");
            }
            other => panic!("expected quiz detail, got {:?}", other),
        }

        // Second toggle hides again
        c.handle_reveal(0);
        assert_eq!(c.view.appended.last().unwrap().role, MessageRole::System);
    }

    #[tokio::test]
    async fn test_reveal_out_of_range_alerts() {
        let (mut c, _backend) = controller(ChatMode::Chat);
        c.handle_reveal(3);
        assert_eq!(c.view.alerts, vec![MSG_NO_DETAIL]);
    }
}
