use iced::widget::{button, column, container, text, text_editor};
use iced::{Alignment, Element, Length, Task, Theme};
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Declare the modules
mod attachment;
mod state;
mod ui;
mod upload;

use state::annotations::{AnnotationStore, ContributionImage};
use state::data::MuseumObject;
use state::pagination::PageWindow;
use state::query::{
    self, DateBucket, DescriptionStatus, FilterCriteria, GalleryStatus, ReferenceStatus, SortKey,
    StatusBreakdown,
};
use state::{cache, dataset};
use ui::Choice;
use upload::{GithubUploader, UploadConfig};

/// Quiet period after the last search keystroke before the filter
/// pipeline runs. Trailing edge only: a burst of keystrokes produces a
/// single recompute.
const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Where the startup dataset load stands.
pub(crate) enum LoadState {
    Loading,
    /// The automatic load failed; the curator picks the file manually.
    NeedsFile,
    Ready,
}

/// Transient editing state for the open detail pane.
pub(crate) struct DetailState {
    /// Index into the full collection (not the filtered view), so an
    /// open pane survives refiltering.
    pub(crate) index: usize,
    pub(crate) editing: bool,
    pub(crate) notes: text_editor::Content,
    pub(crate) pending_images: Vec<ContributionImage>,
    pub(crate) saving: bool,
    pub(crate) error: Option<String>,
}

/// Main application state
pub(crate) struct MuseumArchive {
    pub(crate) load_state: LoadState,
    /// The canonical collection; never reordered after load
    pub(crate) objects: Vec<MuseumObject>,
    pub(crate) departments: Vec<String>,
    pub(crate) criteria: FilterCriteria,
    /// Indices into `objects`, in filtered + sorted order
    pub(crate) filtered: Vec<usize>,
    pub(crate) window: PageWindow,
    pub(crate) breakdown: StatusBreakdown,
    pub(crate) annotations: AnnotationStore,
    pub(crate) uploader: Option<GithubUploader>,
    /// Bumped on every keystroke; only the matching debounce fires
    pub(crate) search_generation: u64,
    pub(crate) detail: Option<DetailState>,
    /// Status message to display to the user
    pub(crate) status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub(crate) enum Message {
    DatasetLoaded(Result<Vec<MuseumObject>, String>),
    PickDatasetFile,
    DatasetFileParsed(Result<Vec<MuseumObject>, String>),
    SearchChanged(String),
    SearchDebounced(u64),
    DepartmentSelected(Choice<String>),
    DateBucketSelected(Choice<DateBucket>),
    GalleryStatusSelected(Choice<GalleryStatus>),
    ReferenceStatusSelected(Choice<ReferenceStatus>),
    DescriptionStatusSelected(Choice<DescriptionStatus>),
    SortSelected(Choice<SortKey>),
    ResetFilters,
    LoadMore,
    ShowDetail(usize),
    CloseDetail,
    ToggleDocumented(i64),
    StartEditing,
    CancelEditing,
    NotesEdited(text_editor::Action),
    PickImages,
    ImagesRead(Vec<ContributionImage>),
    RemovePendingImage(usize),
    RemoveStoredImage { object_id: i64, index: usize },
    SaveContribution,
    ContributionReady {
        object_id: i64,
        images: Vec<ContributionImage>,
        notes: String,
        upload_error: Option<String>,
    },
    ExportProgress,
    ImportProgress,
    ResetProgress,
}

impl MuseumArchive {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        // If this fails, we panic because the app cannot function
        // without its annotation database
        let annotations = AnnotationStore::open(&AnnotationStore::default_db_path())
            .expect("Failed to initialize annotation database. Check permissions and disk space.");

        let uploader = UploadConfig::from_env().map(GithubUploader::new);
        if uploader.is_some() {
            info!("remote image publishing configured");
        }

        let archive = MuseumArchive {
            load_state: LoadState::Loading,
            objects: Vec::new(),
            departments: Vec::new(),
            criteria: FilterCriteria {
                sort: Some(SortKey::Accession),
                ..FilterCriteria::default()
            },
            filtered: Vec::new(),
            window: PageWindow::new(),
            breakdown: StatusBreakdown::default(),
            annotations,
            uploader,
            search_generation: 0,
            detail: None,
            status: "Loading collection...".into(),
        };

        let load = Task::perform(
            dataset::load(cache::cache_db_path(), dataset::dataset_path()),
            |result| Message::DatasetLoaded(result.map_err(|e| e.to_string())),
        );

        (archive, load)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::DatasetLoaded(Ok(objects)) => {
                self.install_collection(objects);
                Task::none()
            }
            Message::DatasetLoaded(Err(e)) => {
                warn!("dataset load failed: {e}");
                self.load_state = LoadState::NeedsFile;
                self.status = "Could not load the dataset. Select the JSON file manually.".into();
                Task::none()
            }
            Message::PickDatasetFile => {
                let file = FileDialog::new()
                    .set_title("Select Dataset File")
                    .add_filter("JSON", &["json"])
                    .pick_file();

                match file {
                    Some(path) => Task::perform(
                        async move {
                            let text = tokio::fs::read_to_string(&path)
                                .await
                                .map_err(|e| e.to_string())?;
                            dataset::parse_dataset(&text).map_err(|e| e.to_string())
                        },
                        Message::DatasetFileParsed,
                    ),
                    None => Task::none(),
                }
            }
            Message::DatasetFileParsed(Ok(objects)) => {
                self.install_collection(objects);
                Task::none()
            }
            Message::DatasetFileParsed(Err(e)) => {
                warn!("manual dataset file rejected: {e}");
                alert(&format!("Error parsing JSON file: {e}"));
                Task::none()
            }
            Message::SearchChanged(term) => {
                self.criteria.search = term;
                self.search_generation += 1;
                let generation = self.search_generation;
                Task::perform(
                    async move {
                        tokio::time::sleep(Duration::from_millis(SEARCH_DEBOUNCE_MS)).await;
                        generation
                    },
                    Message::SearchDebounced,
                )
            }
            Message::SearchDebounced(generation) => {
                if generation == self.search_generation {
                    self.apply_filters();
                }
                Task::none()
            }
            Message::DepartmentSelected(choice) => {
                self.criteria.department = choice.into_option().unwrap_or_default();
                self.apply_filters();
                Task::none()
            }
            Message::DateBucketSelected(choice) => {
                self.criteria.date_bucket = choice.into_option();
                self.apply_filters();
                Task::none()
            }
            Message::GalleryStatusSelected(choice) => {
                self.criteria.gallery_status = choice.into_option();
                self.apply_filters();
                Task::none()
            }
            Message::ReferenceStatusSelected(choice) => {
                self.criteria.reference_status = choice.into_option();
                self.apply_filters();
                Task::none()
            }
            Message::DescriptionStatusSelected(choice) => {
                self.criteria.description_status = choice.into_option();
                self.apply_filters();
                Task::none()
            }
            Message::SortSelected(choice) => {
                self.criteria.sort = choice.into_option();
                self.apply_filters();
                Task::none()
            }
            Message::ResetFilters => {
                self.criteria = FilterCriteria {
                    sort: Some(SortKey::Accession),
                    ..FilterCriteria::default()
                };
                self.apply_filters();
                Task::none()
            }
            Message::LoadMore => {
                let _ = self.window.load_more(self.filtered.len());
                Task::none()
            }
            Message::ShowDetail(index) => {
                let object_id = self.objects[index].object_id;
                let notes = self
                    .annotations
                    .contribution(object_id)
                    .map(|c| c.notes.clone())
                    .unwrap_or_default();
                self.detail = Some(DetailState {
                    index,
                    editing: false,
                    notes: text_editor::Content::with_text(&notes),
                    pending_images: Vec::new(),
                    saving: false,
                    error: None,
                });
                Task::none()
            }
            Message::CloseDetail => {
                self.detail = None;
                Task::none()
            }
            Message::ToggleDocumented(object_id) => {
                match self.annotations.toggle(object_id) {
                    Ok(documented) => {
                        info!("object {object_id} documented: {documented}");
                    }
                    Err(e) => {
                        warn!("failed to persist documented flag for {object_id}: {e}");
                        let message = e.user_message();
                        if let Some(detail) = &mut self.detail {
                            detail.error = Some(message.clone());
                        }
                        self.status = message;
                    }
                }
                Task::none()
            }
            Message::StartEditing => {
                if let Some(detail) = &mut self.detail {
                    let object_id = self.objects[detail.index].object_id;
                    let notes = self
                        .annotations
                        .contribution(object_id)
                        .map(|c| c.notes.clone())
                        .unwrap_or_default();
                    detail.notes = text_editor::Content::with_text(&notes);
                    detail.editing = true;
                    detail.error = None;
                }
                Task::none()
            }
            Message::CancelEditing => {
                if let Some(detail) = &mut self.detail {
                    detail.editing = false;
                    detail.pending_images.clear();
                }
                Task::none()
            }
            Message::NotesEdited(action) => {
                if let Some(detail) = &mut self.detail {
                    detail.notes.perform(action);
                }
                Task::none()
            }
            Message::PickImages => {
                let files = FileDialog::new()
                    .set_title("Select Images")
                    .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
                    .pick_files();

                match files {
                    Some(paths) => {
                        Task::perform(attachment::read_images(paths), Message::ImagesRead)
                    }
                    None => Task::none(),
                }
            }
            Message::ImagesRead(images) => {
                if let Some(detail) = &mut self.detail {
                    detail.pending_images.extend(images);
                }
                Task::none()
            }
            Message::RemovePendingImage(index) => {
                if let Some(detail) = &mut self.detail {
                    if index < detail.pending_images.len() {
                        detail.pending_images.remove(index);
                    }
                }
                Task::none()
            }
            Message::RemoveStoredImage { object_id, index } => {
                if let Err(e) = self.annotations.remove_image(object_id, index) {
                    warn!("failed to remove image {index} for {object_id}: {e}");
                    let message = e.user_message();
                    if let Some(detail) = &mut self.detail {
                        detail.error = Some(message.clone());
                    }
                    self.status = message;
                }
                Task::none()
            }
            Message::SaveContribution => {
                let Some(detail) = &mut self.detail else {
                    return Task::none();
                };
                let object_id = self.objects[detail.index].object_id;
                let images = std::mem::take(&mut detail.pending_images);
                let notes = detail.notes.text().trim_end_matches('\n').to_string();

                if let Some(uploader) = self.uploader.clone() {
                    detail.saving = true;
                    return Task::perform(
                        async move {
                            let (images, upload_error) =
                                upload::publish_images(&uploader, object_id, images).await;
                            (object_id, images, notes, upload_error)
                        },
                        |(object_id, images, notes, upload_error)| Message::ContributionReady {
                            object_id,
                            images,
                            notes,
                            upload_error,
                        },
                    );
                }

                self.finish_save(object_id, images, notes, None);
                Task::none()
            }
            Message::ContributionReady {
                object_id,
                images,
                notes,
                upload_error,
            } => {
                self.finish_save(object_id, images, notes, upload_error);
                Task::none()
            }
            Message::ExportProgress => {
                let file = FileDialog::new()
                    .set_title("Export Documentation Progress")
                    .set_file_name("museum_documentation_progress.json")
                    .save_file();

                if let Some(path) = file {
                    let snapshot = self.annotations.export_progress(self.objects.len());
                    match std::fs::write(&path, snapshot) {
                        Ok(()) => {
                            self.status = format!("Progress exported to {}", path.display());
                        }
                        Err(e) => {
                            warn!("progress export failed: {e}");
                            self.status = format!("Could not export progress: {e}");
                        }
                    }
                }
                Task::none()
            }
            Message::ImportProgress => {
                let file = FileDialog::new()
                    .set_title("Import Documentation Progress")
                    .add_filter("JSON", &["json"])
                    .pick_file();

                if let Some(path) = file {
                    match std::fs::read_to_string(&path) {
                        Ok(text) => match self.annotations.import_progress(&text) {
                            Ok(count) => {
                                self.status = format!("Imported {count} documented objects");
                            }
                            Err(e) => {
                                warn!("progress import rejected: {e}");
                                alert("Error importing progress data. Please check the file format.");
                            }
                        },
                        Err(e) => {
                            warn!("progress import unreadable: {e}");
                            alert("Error importing progress data. Please check the file format.");
                        }
                    }
                }
                Task::none()
            }
            Message::ResetProgress => {
                let confirmed = MessageDialog::new()
                    .set_level(MessageLevel::Warning)
                    .set_title("Reset Progress")
                    .set_description(
                        "Are you sure you want to reset all documentation progress? \
                         This cannot be undone.",
                    )
                    .set_buttons(MessageButtons::OkCancel)
                    .show();

                if matches!(confirmed, MessageDialogResult::Ok | MessageDialogResult::Yes) {
                    match self.annotations.reset_progress() {
                        Ok(()) => self.status = "Documentation progress has been reset.".into(),
                        Err(e) => {
                            warn!("progress reset failed to persist: {e}");
                            self.status = e.user_message();
                        }
                    }
                }
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        match &self.load_state {
            LoadState::Loading => centered(
                column![text("Loading collection...").size(24)]
                    .spacing(20)
                    .align_x(Alignment::Center)
                    .into(),
            ),
            LoadState::NeedsFile => centered(
                column![
                    text("No dataset loaded").size(24),
                    text("The archive could not read its dataset file. Select it manually.")
                        .size(14),
                    button("Select Dataset File")
                        .on_press(Message::PickDatasetFile)
                        .padding(10),
                    text(&self.status).size(12),
                ]
                .spacing(20)
                .align_x(Alignment::Center)
                .into(),
            ),
            LoadState::Ready => match &self.detail {
                Some(detail) => ui::detail::view(self, detail),
                None => ui::browse::view(self),
            },
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }

    /// Adopt a freshly loaded collection and show it unfiltered.
    fn install_collection(&mut self, objects: Vec<MuseumObject>) {
        info!("collection ready with {} objects", objects.len());
        dataset::report_completeness(&objects);

        self.departments = query::department_options(&objects);
        self.objects = objects;
        self.load_state = LoadState::Ready;
        self.detail = None;
        self.status = format!("Ready. {} objects in the archive.", self.objects.len());
        self.apply_filters();
    }

    /// Re-run the query pipeline and rewind the result window. Called on
    /// every criteria change; previously shown cards are discarded.
    fn apply_filters(&mut self) {
        self.filtered = query::filter_and_sort(&self.objects, &self.criteria);
        self.breakdown = StatusBreakdown::tally(&self.objects, &self.filtered);
        self.window.reset();
        let _ = self.window.load_more(self.filtered.len());
    }

    /// Merge a finished save into the annotation store and re-render the
    /// detail pane from the just-saved state.
    fn finish_save(
        &mut self,
        object_id: i64,
        images: Vec<ContributionImage>,
        notes: String,
        upload_error: Option<String>,
    ) {
        match self.annotations.upsert_contribution(object_id, images, notes) {
            Ok(()) => {
                self.status = "Contribution saved.".into();
                if let Some(detail) = &mut self.detail {
                    detail.saving = false;
                    detail.editing = false;
                    detail.error = upload_error
                        .map(|e| format!("Saved locally, but publishing failed: {e}"));
                }
            }
            Err(e) => {
                // The in-memory contribution is kept; only persistence
                // failed. The curator sees the saved state plus a warning.
                warn!("failed to persist contribution for {object_id}: {e}");
                let message = e.user_message();
                self.status = message.clone();
                if let Some(detail) = &mut self.detail {
                    detail.saving = false;
                    detail.editing = false;
                    detail.error = Some(message);
                }
            }
        }
    }
}

fn centered(content: Element<'_, Message>) -> Element<'_, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

/// Blocking alert for malformed user-supplied input.
fn alert(description: &str) {
    let _ = MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("Museum Archive")
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn main() -> iced::Result {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    iced::application(
        "Museum Archive",
        MuseumArchive::update,
        MuseumArchive::view,
    )
    .theme(MuseumArchive::theme)
    .centered()
    .run_with(MuseumArchive::new)
}
