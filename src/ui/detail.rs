/// Detail screen: one record, its annotation state, and the
/// contribution editor
///
/// The documented button and the contribution display always re-derive
/// from the store, so a toggle or save is visible immediately with no
/// intermediate state.

use chrono::DateTime;
use iced::widget::{button, column, image as iced_image, row, scrollable, text, text_editor};
use iced::{Element, Length};

use crate::state::annotations::Contribution;
use crate::state::data::{format_year, normalize_department, MuseumObject};
use crate::{DetailState, Message, MuseumArchive};

pub fn view<'a>(app: &'a MuseumArchive, detail: &'a DetailState) -> Element<'a, Message> {
    let obj = &app.objects[detail.index];
    let documented = app.annotations.is_documented(obj.object_id);

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

    let doc_label = if documented {
        "DOCUMENTED"
    } else {
        "MARK AS DOCUMENTED"
    };

    let mut content = column![
        button("< Back to results").on_press(Message::CloseDetail).padding(8),
        text(title).size(28),
        text(accession).size(16),
        button(doc_label)
            .on_press(Message::ToggleDocumented(obj.object_id))
            .padding(10),
    ]
    .spacing(18);

    if let Some(error) = &detail.error {
        content = content.push(text(error).size(14));
    }

    content = content.push(contribution_section(app, detail, obj));

    if obj.has_description() {
        content = content.push(description_section(obj));
    }
    content = content.push(core_identification_section(obj));
    content = content.push(physical_description_section(obj));
    if has_geo_data(obj) {
        content = content.push(provenance_section(obj));
    }
    content = content.push(chronology_section(obj));
    if has_artist_data(obj) {
        content = content.push(artist_section(obj));
    }
    content = content.push(references_section(obj));
    content = content.push(additional_info_section(obj));
    content = content.push(links_section(obj));

    scrollable(content.padding(20))
        .height(Length::Fill)
        .into()
}

// ---- curator contribution ----

fn contribution_section<'a>(
    app: &'a MuseumArchive,
    detail: &'a DetailState,
    obj: &'a MuseumObject,
) -> Element<'a, Message> {
    let contribution = app.annotations.contribution(obj.object_id);

    let mut section = column![text("Curator Notes & Images").size(18)].spacing(8);

    if detail.editing {
        return editing_view(section, detail);
    }

    match contribution {
        Some(contribution) if !contribution.is_empty() => {
            section = section.push(stored_images(obj.object_id, contribution));
            if !contribution.notes.is_empty() {
                section = section.push(text(&contribution.notes).size(14));
            }
            section = section.push(text(updated_line(&contribution.timestamp)).size(12));
            section = section.push(
                button("Edit Contribution")
                    .on_press(Message::StartEditing)
                    .padding(8),
            );
        }
        _ => {
            section = section.push(text("No contributions yet. Add your own images and notes!").size(14));
            section = section.push(
                button("Add Images & Notes")
                    .on_press(Message::StartEditing)
                    .padding(8),
            );
        }
    }

    section.into()
}

fn stored_images(object_id: i64, contribution: &Contribution) -> Element<'_, Message> {
    let mut list = column![].spacing(6);
    for (index, img) in contribution.images.iter().enumerate() {
        let preview: Element<'_, Message> = match img.local_bytes() {
            Some(bytes) => iced_image(iced::widget::image::Handle::from_bytes(bytes))
                .width(Length::Fixed(180.0))
                .into(),
            None => text(img.url.as_deref().unwrap_or(&img.filename).to_string())
                .size(12)
                .into(),
        };
        list = list.push(
            row![
                preview,
                button("Remove")
                    .on_press(Message::RemoveStoredImage { object_id, index })
                    .padding(6),
            ]
            .spacing(10),
        );
    }
    list.into()
}

fn editing_view<'a>(
    mut section: iced::widget::Column<'a, Message>,
    detail: &'a DetailState,
) -> Element<'a, Message> {
    section = section.push(text("Additional notes:").size(13));
    section = section.push(
        text_editor(&detail.notes)
            .on_action(Message::NotesEdited)
            .height(Length::Fixed(120.0)),
    );
    section = section.push(
        button("Attach Images")
            .on_press(Message::PickImages)
            .padding(8),
    );

    for (index, img) in detail.pending_images.iter().enumerate() {
        section = section.push(
            row![
                text(&img.filename).size(12),
                button("Remove").on_press(Message::RemovePendingImage(index)).padding(4),
            ]
            .spacing(10),
        );
    }

    let save_label = if detail.saving { "Saving..." } else { "Save Contribution" };
    section = section.push(
        row![
            button(save_label)
                .on_press_maybe((!detail.saving).then_some(Message::SaveContribution))
                .padding(8),
            button("Cancel").on_press(Message::CancelEditing).padding(8),
        ]
        .spacing(10),
    );

    section.into()
}

fn updated_line(timestamp: &str) -> String {
    let formatted = DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%B %e, %Y %l:%M %p").to_string())
        .unwrap_or_else(|_| timestamp.to_string());
    format!("Updated on {formatted}")
}

// ---- record sections ----

fn description_section(obj: &MuseumObject) -> Element<'_, Message> {
    let mut section = column![text("Description").size(18)].spacing(6);
    for value in [
        &obj.description,
        &obj.object_description,
        &obj.label,
        &obj.label_text,
    ] {
        if !value.is_empty() {
            section = section.push(text(value).size(14));
        }
    }
    section.into()
}

fn core_identification_section(obj: &MuseumObject) -> Element<'_, Message> {
    section(
        "Core Identification",
        vec![
            ("Object ID", obj.object_id.to_string()),
            ("Accession Number", obj.accession_number.clone()),
            ("Object Name", obj.object_name.clone()),
            ("Title", obj.title.clone()),
            ("Department", normalize_department(&obj.department).to_string()),
            ("Classification", obj.classification.clone()),
            ("Is Highlight", yes_no(obj.is_highlight)),
            ("Is Timeline Work", yes_no(obj.is_timeline_work)),
        ],
    )
}

fn physical_description_section(obj: &MuseumObject) -> Element<'_, Message> {
    let mut items = vec![
        ("Medium", obj.medium.clone()),
        ("Dimensions", obj.dimensions.clone()),
    ];

    if !obj.measurements.is_empty() {
        let detailed = obj
            .measurements
            .iter()
            .map(|m| {
                let mut parts = Vec::new();
                if !m.element_name.is_empty() {
                    parts.push(m.element_name.clone());
                }
                if !m.element_description.is_empty() {
                    parts.push(m.element_description.clone());
                }
                if !m.element_measurements.is_empty() {
                    let dims = m
                        .element_measurements
                        .iter()
                        .map(|(key, value)| format!("{key}: {}", plain_value(value)))
                        .collect::<Vec<_>>()
                        .join(", ");
                    parts.push(dims);
                }
                parts.join(" - ")
            })
            .collect::<Vec<_>>()
            .join("; ");
        items.push(("Detailed Measurements", detailed));
    }

    section("Physical Description", items)
}

fn has_geo_data(obj: &MuseumObject) -> bool {
    [
        &obj.city,
        &obj.country,
        &obj.region,
        &obj.subregion,
        &obj.locale,
        &obj.locus,
        &obj.excavation,
        &obj.river,
    ]
    .iter()
    .any(|value| !value.is_empty())
}

fn provenance_section(obj: &MuseumObject) -> Element<'_, Message> {
    section(
        "Geographical Origin & Provenance",
        vec![
            ("Geography Type", obj.geography_type.clone()),
            ("Country", obj.country.clone()),
            ("Region", obj.region.clone()),
            ("Subregion", obj.subregion.clone()),
            ("City", obj.city.clone()),
            ("State/Province", obj.state.clone()),
            ("County", obj.county.clone()),
            ("Locale", obj.locale.clone()),
            ("Locus", obj.locus.clone()),
            ("Excavation", obj.excavation.clone()),
            ("River", obj.river.clone()),
        ],
    )
}

fn chronology_section(obj: &MuseumObject) -> Element<'_, Message> {
    let begin = if obj.object_begin_date.is_empty() {
        String::new()
    } else {
        format_year(&obj.object_begin_date)
    };
    let end = if obj.object_end_date.is_empty() {
        String::new()
    } else {
        format_year(&obj.object_end_date)
    };

    section(
        "Chronology & Cultural Context",
        vec![
            ("Culture", obj.culture.clone()),
            ("Period", obj.period.clone()),
            ("Dynasty", obj.dynasty.clone()),
            ("Reign", obj.reign.clone()),
            ("Object Date", obj.object_date.clone()),
            ("Begin Date", begin),
            ("End Date", end),
        ],
    )
}

fn has_artist_data(obj: &MuseumObject) -> bool {
    !obj.artist_display_name.is_empty()
        || !obj.artist_role.is_empty()
        || !obj.artist_nationality.is_empty()
}

fn artist_section(obj: &MuseumObject) -> Element<'_, Message> {
    let dates = if !obj.artist_begin_date.is_empty() && !obj.artist_end_date.is_empty() {
        format!("{} - {}", obj.artist_begin_date, obj.artist_end_date)
    } else {
        String::new()
    };

    let mut items = vec![
        ("Artist Name", obj.artist_display_name.clone()),
        ("Artist Role", obj.artist_role.clone()),
        ("Artist Bio", obj.artist_display_bio.clone()),
        ("Nationality", obj.artist_nationality.clone()),
        ("Artist Dates", dates),
    ];

    if !obj.constituents.is_empty() {
        let all = obj
            .constituents
            .iter()
            .map(|c| {
                if c.role.is_empty() {
                    c.name.clone()
                } else {
                    format!("{} ({})", c.name, c.role)
                }
            })
            .collect::<Vec<_>>()
            .join("; ");
        items.push(("All Constituents", all));
    }

    section("Artist / Maker", items)
}

fn references_section(obj: &MuseumObject) -> Element<'_, Message> {
    let on_view = obj.is_on_view();
    let has_refs = obj.has_references();

    let callout = if obj.is_photographable() {
        format!(
            "PHOTOGRAPHABLE OBJECT! Currently on display in Gallery {} with no published references in the database. Available for in-person photography at the museum.",
            obj.gallery_number
        )
    } else if on_view && has_refs {
        format!(
            "On View in Gallery {}. Currently on display, with published references listed below.",
            obj.gallery_number
        )
    } else if !on_view && !has_refs {
        "Challenging object: in storage with no published references in the database. Special access requests or unpublished excavation reports may be required.".to_string()
    } else {
        "In storage. Not currently on public display, but the references below may lead to published images.".to_string()
    };

    let gallery = if obj.gallery_number.is_empty() {
        "Not on view".to_string()
    } else {
        obj.gallery_number.clone()
    };

    let mut list = column![
        text("References & Documentation").size(18),
        text(callout).size(13),
    ]
    .spacing(6);

    for (label, value) in [
        ("Gallery Number", gallery),
        ("Exhibition History", obj.exhibition_history.clone()),
        ("Bibliographic References", obj.references.clone()),
        ("Portfolio/Series", obj.portfolio.clone()),
        ("Credit Line", obj.credit_line.clone()),
        ("Repository", obj.repository.clone()),
        ("Link Resource", obj.link_resource.clone()),
        ("Metadata Last Updated", obj.metadata_date.clone()),
    ] {
        list = list.push(detail_item(label, value));
    }

    list.into()
}

fn additional_info_section(obj: &MuseumObject) -> Element<'_, Message> {
    let mut items = vec![("Is Public Domain", yes_no(obj.is_public_domain))];
    if !obj.tags.is_empty() {
        let tags = obj
            .tags
            .iter()
            .map(|tag| tag.term().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        items.push(("Tags", tags));
    }
    section("Additional Information", items)
}

fn links_section(obj: &MuseumObject) -> Element<'_, Message> {
    section(
        "External Resources",
        vec![
            ("Museum Page", obj.object_url.clone()),
            ("Wikidata", obj.object_wikidata_url.clone()),
        ],
    )
}

// ---- building blocks ----

fn section(title: &str, items: Vec<(&'static str, String)>) -> Element<'static, Message> {
    let mut list = column![text(title.to_string()).size(18)].spacing(6);
    for (label, value) in items {
        list = list.push(detail_item(label, value));
    }
    list.into()
}

fn detail_item(label: &'static str, value: String) -> Element<'static, Message> {
    let value = if value.is_empty() {
        "Not specified".to_string()
    } else {
        value
    };
    column![text(label).size(11), text(value).size(13)]
        .spacing(2)
        .into()
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

fn plain_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
