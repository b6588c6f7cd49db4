/// Browse screen: filter bar, result summary, card grid, load-more
///
/// Pure widget composition over the app state; every interaction is a
/// `Message` handled by the shell.

use iced::widget::{button, column, pick_list, progress_bar, row, scrollable, text, text_input};
use iced::{Element, Length};
use iced_aw::Wrap;

use crate::state::data::{normalize_department, MuseumObject};
use crate::state::query::{
    DateBucket, DescriptionStatus, GalleryStatus, ReferenceStatus, SortKey,
};
use crate::ui::Choice;
use crate::{Message, MuseumArchive};

pub fn view(app: &MuseumArchive) -> Element<'_, Message> {
    column![
        header(app),
        filter_bar(app),
        result_summary(app),
        object_grid(app),
        text(&app.status).size(14),
    ]
    .spacing(16)
    .padding(20)
    .into()
}

fn header(app: &MuseumArchive) -> Element<'_, Message> {
    let (documented, percentage) = app.annotations.progress(app.objects.len());

    let last_edit = match app.annotations.last_edit() {
        Some(when) => when.format("%B %e, %Y %l:%M %p").to_string(),
        None => "Never".to_string(),
    };

    column![
        text("MUSEUM ARCHIVE").size(32),
        text(format!(
            "{documented} / {} OBJECTS DOCUMENTED ({percentage}%)",
            app.objects.len()
        ))
        .size(14),
        progress_bar(0.0..=100.0, f32::from(percentage)).height(8),
        text(format!("Last edit: {last_edit}")).size(12),
    ]
    .spacing(6)
    .into()
}

fn filter_bar(app: &MuseumArchive) -> Element<'_, Message> {
    let search = text_input(
        "Search title, culture, accession, medium...",
        &app.criteria.search,
    )
    .on_input(Message::SearchChanged)
    .padding(8);

    let departments = pick_list(
        Choice::options("All Departments", &app.departments),
        Some(Choice::from_option(
            "All Departments",
            if app.criteria.department.is_empty() {
                None
            } else {
                Some(app.criteria.department.clone())
            },
        )),
        Message::DepartmentSelected,
    );

    let dates = pick_list(
        Choice::options("All Date Ranges", &DateBucket::ALL),
        Some(Choice::from_option(
            "All Date Ranges",
            app.criteria.date_bucket,
        )),
        Message::DateBucketSelected,
    );

    let gallery = pick_list(
        Choice::options("All Gallery Status", &GalleryStatus::ALL),
        Some(Choice::from_option(
            "All Gallery Status",
            app.criteria.gallery_status,
        )),
        Message::GalleryStatusSelected,
    );

    let references = pick_list(
        Choice::options("All Reference Status", &ReferenceStatus::ALL),
        Some(Choice::from_option(
            "All Reference Status",
            app.criteria.reference_status,
        )),
        Message::ReferenceStatusSelected,
    );

    let descriptions = pick_list(
        Choice::options("All Description Status", &DescriptionStatus::ALL),
        Some(Choice::from_option(
            "All Description Status",
            app.criteria.description_status,
        )),
        Message::DescriptionStatusSelected,
    );

    let sort = pick_list(
        Choice::options("Unsorted", &SortKey::ALL),
        Some(Choice::from_option("Unsorted", app.criteria.sort)),
        Message::SortSelected,
    );

    column![
        search,
        row![departments, dates, gallery].spacing(10),
        row![references, descriptions, sort].spacing(10),
        row![
            button("Reset Filters").on_press(Message::ResetFilters).padding(8),
            button("Export Progress").on_press(Message::ExportProgress).padding(8),
            button("Import Progress").on_press(Message::ImportProgress).padding(8),
            button("Reset Progress").on_press(Message::ResetProgress).padding(8),
        ]
        .spacing(10),
    ]
    .spacing(10)
    .into()
}

fn result_summary(app: &MuseumArchive) -> Element<'_, Message> {
    let shown = app.window.displayed().min(app.filtered.len());
    let mut count_line = format!("Showing {shown} of {} objects", app.filtered.len());
    if app.filtered.len() != app.objects.len() {
        count_line.push_str(&format!(" (filtered from {} total)", app.objects.len()));
    }

    let b = &app.breakdown;
    let breakdown_line = format!(
        "{} On View | {} In Storage | {} Has References | {} No References | {} Photographable | {} Has Description | {} No Description",
        b.on_view,
        b.in_storage,
        b.has_references,
        b.no_references,
        b.photographable,
        b.has_description,
        b.no_description,
    );

    column![text(count_line).size(14), text(breakdown_line).size(12)]
        .spacing(4)
        .into()
}

fn object_grid(app: &MuseumArchive) -> Element<'_, Message> {
    let cards: Vec<Element<'_, Message>> = app.filtered[..app.window.displayed()]
        .iter()
        .map(|&object_index| object_card(&app.objects[object_index], object_index))
        .collect();

    let grid = Wrap::with_elements(cards).spacing(10.0).line_spacing(10.0);

    let mut content = column![grid].spacing(16);
    if app.window.has_more(app.filtered.len()) {
        let remaining = app.filtered.len() - app.window.displayed();
        content = content.push(
            button(text(format!("Load More ({remaining} remaining)")))
                .on_press(Message::LoadMore)
                .padding(10),
        );
    }

    scrollable(content).height(Length::Fill).into()
}

fn object_card(obj: &MuseumObject, object_index: usize) -> Element<'_, Message> {
    let title = if obj.title.is_empty() {
        "Untitled Object".to_string()
    } else {
        obj.title.clone()
    };
    let accession = if obj.accession_number.is_empty() {
        "No accession number".to_string()
    } else {
        obj.accession_number.clone()
    };

    let mut badges = Vec::new();
    if obj.is_on_view() {
        badges.push(format!("Gallery {}", obj.gallery_number));
    } else {
        badges.push("In Storage".to_string());
    }
    if obj.has_references() {
        badges.push("Has References".to_string());
    }
    if obj.is_photographable() {
        badges.push("Photographable!".to_string());
    }

    let mut tags: Vec<&str> = Vec::new();
    for value in [&obj.period, &obj.dynasty, &obj.classification] {
        if !value.is_empty() {
            tags.push(value);
        }
    }
    let tag_line = if tags.is_empty() {
        String::new()
    } else if tags.len() > 3 {
        format!("{} +{} more", tags[..3].join(" | "), tags.len() - 3)
    } else {
        tags.join(" | ")
    };

    let mut body = column![
        text(title).size(16),
        text(accession).size(12),
        text(badges.join("  ")).size(12),
        metadata_row("Culture", &obj.culture, "Unknown culture"),
        metadata_row("Date", &obj.object_date, "Date unknown"),
        metadata_row(
            "Department",
            normalize_department(&obj.department),
            "Unknown department",
        ),
        metadata_row("Medium", &obj.medium, "Unknown medium"),
    ]
    .spacing(4);

    if !tag_line.is_empty() {
        body = body.push(text(tag_line).size(11));
    }

    button(body)
        .on_press(Message::ShowDetail(object_index))
        .padding(12)
        .width(Length::Fixed(280.0))
        .into()
}

fn metadata_row<'a>(label: &'a str, value: &'a str, fallback: &'a str) -> Element<'a, Message> {
    let value = if value.is_empty() { fallback } else { value };
    row![
        text(format!("{label}:")).size(12),
        text(value).size(12),
    ]
    .spacing(6)
    .into()
}
