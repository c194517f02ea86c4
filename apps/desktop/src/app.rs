use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use iced::widget::{
    Column, button, column, container, pick_list, progress_bar, row, scrollable, text, text_input,
};
use iced::{Element, Event, Length, Subscription, Task, Theme, event, window};
use tokio::sync::watch;
use tracing::{debug, warn};
use video_interpreter_core::{
    AnalysisOption, AnalysisResult, CUSTOM_ANALYSIS, ControllerState, CopyConfirmation, FileSummary,
    HttpTransport, LifecycleController, LifecycleState, OptionsCatalog, UploadSurface,
    ValidationError, paragraphs,
};

/// Extensions offered by the file picker.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "avi", "mov", "wmv", "flv", "webm", "mkv", "mpeg", "mpg", "3gp", "ogv",
];

const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub enum Message {
    OptionsLoaded(OptionsCatalog),
    Tick(Instant),
    FileHovered,
    FileHoverLeft,
    FileDropped(PathBuf),
    PickFile,
    FilePicked(Option<PathBuf>),
    FileLoaded(Result<bool, String>),
    ClearFile,
    TypeSelected(AnalysisOption),
    PromptChanged(String),
    Analyze,
    Submitted(Option<ValidationError>),
    Copy,
    Reset,
}

pub struct App {
    controller: LifecycleController,
    surface: UploadSurface,
    rx: watch::Receiver<ControllerState>,
    /// Last controller state seen by the view.
    state: ControllerState,
    /// `None` until the startup fetch settles.
    catalog: Option<OptionsCatalog>,
    drag_active: bool,
    load_error: Option<String>,
    copy: CopyConfirmation,
    now: Instant,
}

impl App {
    pub fn new(transport: Arc<HttpTransport>) -> (Self, Task<Message>) {
        let controller = LifecycleController::new(transport.clone());
        let surface = UploadSurface::new(controller.clone());
        let mut rx = controller.subscribe();
        let state = rx.borrow_and_update().clone();

        let app = Self {
            controller,
            surface,
            rx,
            state,
            catalog: None,
            drag_active: false,
            load_error: None,
            copy: CopyConfirmation::default(),
            now: Instant::now(),
        };

        let load = Task::perform(
            async move { OptionsCatalog::load(transport.as_ref()).await },
            Message::OptionsLoaded,
        );

        (app, load)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        let task = match message {
            Message::OptionsLoaded(catalog) => {
                self.catalog = Some(catalog);
                Task::none()
            }
            Message::Tick(now) => {
                self.now = now;
                Task::none()
            }
            Message::FileHovered => {
                self.drag_active = !self.state.phase.is_busy();
                Task::none()
            }
            Message::FileHoverLeft => {
                self.drag_active = false;
                Task::none()
            }
            Message::FileDropped(path) | Message::FilePicked(Some(path)) => {
                self.drag_active = false;
                self.load(path)
            }
            Message::FilePicked(None) => Task::none(),
            Message::PickFile => Task::perform(
                async {
                    rfd::AsyncFileDialog::new()
                        .add_filter("Video", VIDEO_EXTENSIONS)
                        .pick_file()
                        .await
                        .map(|handle| handle.path().to_path_buf())
                },
                Message::FilePicked,
            ),
            Message::FileLoaded(Ok(selected)) => {
                if selected {
                    self.load_error = None;
                }
                Task::none()
            }
            Message::FileLoaded(Err(err)) => {
                warn!(error = %err, "could not load video");
                self.load_error = Some(err);
                Task::none()
            }
            Message::ClearFile => {
                self.surface.clear();
                self.load_error = None;
                Task::none()
            }
            Message::TypeSelected(option) => {
                self.controller.set_analysis_type(Some(option.key));
                Task::none()
            }
            Message::PromptChanged(prompt) => {
                self.controller.set_custom_prompt(prompt);
                Task::none()
            }
            Message::Analyze => {
                let controller = self.controller.clone();
                self.copy = CopyConfirmation::default();
                Task::perform(
                    async move { controller.analyze().await.err() },
                    Message::Submitted,
                )
            }
            Message::Submitted(rejected) => {
                if let Some(err) = rejected {
                    debug!(error = %err, "analysis not submitted");
                }
                Task::none()
            }
            Message::Copy => match self.state.result.as_ref().and_then(|r| r.result.clone()) {
                Some(text) => {
                    self.copy.mark(Instant::now());
                    iced::clipboard::write(text)
                }
                None => Task::none(),
            },
            Message::Reset => {
                self.controller.reset();
                self.copy = CopyConfirmation::default();
                self.load_error = None;
                Task::none()
            }
        };

        self.sync();
        task
    }

    fn load(&mut self, path: PathBuf) -> Task<Message> {
        if self.state.phase.is_busy() {
            return Task::none();
        }
        let surface = self.surface.clone();
        Task::perform(
            async move { surface.select_path(&path).await.map_err(|e| e.to_string()) },
            Message::FileLoaded,
        )
    }

    fn sync(&mut self) {
        if self.rx.has_changed().unwrap_or(false) {
            self.state = self.rx.borrow_and_update().clone();
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            iced::time::every(TICK).map(Message::Tick),
            event::listen_with(|event, _status, _window| match event {
                Event::Window(window::Event::FileHovered(_)) => Some(Message::FileHovered),
                Event::Window(window::Event::FilesHoveredLeft) => Some(Message::FileHoverLeft),
                Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
                _ => None,
            }),
        ])
    }

    pub fn view(&self) -> Element<'_, Message> {
        let busy = self.state.phase.is_busy();

        let mut content = column![
            text("Video Interpreter").size(24),
            self.upload_view(busy),
            self.options_view(busy),
        ]
        .spacing(16)
        .padding(20)
        .max_width(720);

        if let Some(validation) = &self.state.validation {
            content = content.push(text(validation.to_string()).style(text::danger));
        }

        content = content.push(
            row![
                button(text(if busy { "Analyzing..." } else { "Analyze Video" }))
                    .on_press_maybe(self.state.can_submit().then_some(Message::Analyze)),
                button("Reset")
                    .style(button::secondary)
                    .on_press(Message::Reset),
            ]
            .spacing(10),
        );

        if busy || self.state.progress > 0 {
            content = content.push(
                column![
                    progress_bar(0.0..=100.0, f32::from(self.state.progress)),
                    text(format!("{}%", self.state.progress)).size(12),
                ]
                .spacing(4),
            );
        }

        if let Some(error) = &self.state.error {
            content = content.push(text(error).style(text::danger));
        }

        if let Some(result) = self.result_view() {
            content = content.push(result);
        }

        scrollable(container(content).center_x(Length::Fill)).into()
    }

    fn upload_view(&self, busy: bool) -> Element<'_, Message> {
        let body: Element<'_, Message> = match &self.state.file {
            Some(file) => {
                let summary = FileSummary::from(file);
                row![
                    column![
                        text(summary.name),
                        text(format!("{} · {}", summary.size, summary.mime_type)).size(12),
                    ]
                    .spacing(4)
                    .width(Length::Fill),
                    button("Remove")
                        .style(button::danger)
                        .on_press_maybe((!busy).then_some(Message::ClearFile)),
                ]
                .spacing(10)
                .into()
            }
            None => column![
                text(if self.drag_active {
                    "Drop the video here"
                } else {
                    "Drag and drop a video file"
                }),
                button("Browse...").on_press_maybe((!busy).then_some(Message::PickFile)),
            ]
            .spacing(8)
            .into(),
        };

        let style: fn(&Theme) -> container::Style = if self.drag_active {
            container::rounded_box
        } else {
            container::bordered_box
        };

        let mut upload = column![container(body).padding(16).width(Length::Fill).style(style)];
        if let Some(err) = &self.load_error {
            upload = upload.push(text(err).style(text::danger).size(12));
        }
        upload.spacing(6).into()
    }

    fn options_view(&self, busy: bool) -> Element<'_, Message> {
        let Some(catalog) = &self.catalog else {
            return text("Loading analysis types...").into();
        };

        let selected = self
            .state
            .analysis_type
            .as_deref()
            .and_then(|key| catalog.get(key))
            .cloned();

        let mut options = column![
            pick_list(catalog.options(), selected.clone(), Message::TypeSelected)
                .placeholder("Select an analysis type")
                .width(Length::Fill),
        ]
        .spacing(8);

        if let Some(notice) = catalog.notice() {
            options = options.push(text(notice).style(text::danger).size(12));
        }
        if let Some(option) = selected {
            options = options.push(text(option.description).size(12));
        }
        if self.state.analysis_type.as_deref() == Some(CUSTOM_ANALYSIS) {
            options = options.push(
                text_input(
                    "Describe what you want to know about the video...",
                    &self.state.custom_prompt,
                )
                .on_input_maybe((!busy).then_some(Message::PromptChanged)),
            );
        }

        options.into()
    }

    /// Result worth rendering: every success, and failed payloads that still carry text.
    fn shown_result(&self) -> Option<&AnalysisResult> {
        let result = self.state.result.as_ref()?;
        match self.state.phase {
            LifecycleState::Succeeded => Some(result),
            LifecycleState::Failed if !result.text().trim().is_empty() => Some(result),
            _ => None,
        }
    }

    fn result_view(&self) -> Option<Element<'_, Message>> {
        let result = self.shown_result()?;

        let heading = result
            .analysis_description
            .as_deref()
            .or(result.analysis_type.as_deref())
            .unwrap_or("Analysis");

        let body = Column::with_children(
            paragraphs(result.text())
                .into_iter()
                .map(|p| Element::from(text(p.lines.join("\n")))),
        )
        .spacing(10);

        Some(
            column![
                row![
                    text(heading).size(18).width(Length::Fill),
                    button(text(self.copy.label(self.now))).on_press(Message::Copy),
                ]
                .spacing(10),
                container(body).padding(12).width(Length::Fill).style(container::rounded_box),
            ]
            .spacing(8)
            .into(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use video_interpreter_core::ClientConfig;

    fn app() -> App {
        // Nothing listens here; the options fetch is never awaited in these tests.
        let transport = HttpTransport::new(ClientConfig::new("http://127.0.0.1:9")).unwrap();
        App::new(Arc::new(transport)).0
    }

    #[tokio::test]
    async fn selecting_a_type_reaches_the_controller() {
        let mut app = app();
        let _ = app.update(Message::TypeSelected(AnalysisOption::new(
            CUSTOM_ANALYSIS,
            "Custom analysis",
        )));

        assert_eq!(app.state.analysis_type.as_deref(), Some(CUSTOM_ANALYSIS));
        assert!(!app.state.can_submit());
    }

    #[tokio::test]
    async fn reset_clears_load_errors_and_selection() {
        let mut app = app();
        let _ = app.update(Message::FileLoaded(Err("could not read".into())));
        assert!(app.load_error.is_some());

        let _ = app.update(Message::Reset);
        assert!(app.load_error.is_none());
        assert_eq!(app.state.phase, LifecycleState::Idle);
        assert!(app.state.file.is_none());
    }

    #[tokio::test]
    async fn failed_payload_text_stays_visible() {
        let mut app = app();
        let mut state = ControllerState::default();
        state.phase = LifecycleState::Failed;
        state.error = Some("Quota exceeded".into());
        state.result = Some(AnalysisResult {
            result: Some("Partial notes".into()),
            ..AnalysisResult::failure("technical_analysis", "Quota exceeded")
        });
        app.state = state;

        let shown = app.shown_result().unwrap();
        assert_eq!(shown.text(), "Partial notes");
        assert!(app.result_view().is_some());

        app.state.result = Some(AnalysisResult::failure("technical_analysis", "Quota exceeded"));
        assert!(app.shown_result().is_none());

        app.state.phase = LifecycleState::InFlight;
        app.state.result = Some(AnalysisResult::success("technical_analysis", "Technical", "x"));
        assert!(app.shown_result().is_none());
    }

    #[tokio::test]
    async fn drag_hover_toggles_highlight() {
        let mut app = app();
        let _ = app.update(Message::FileHovered);
        assert!(app.drag_active);
        let _ = app.update(Message::FileHoverLeft);
        assert!(!app.drag_active);
    }
}
