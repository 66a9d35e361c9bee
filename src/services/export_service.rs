use crate::error::Result;
use crate::models::lead::{LeadStatus, LeadWithAssignee};
use chrono::NaiveDate;
use rust_xlsxwriter::*;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct ExportService;

const COLUMNS: [(&str, f64); 12] = [
    ("#", 6.0),
    ("Full Name", 20.0),
    ("Email", 25.0),
    ("Phone", 15.0),
    ("Source", 14.0),
    ("Project Type", 20.0),
    ("Budget", 14.0),
    ("Status", 14.0),
    ("Follow-Up Date", 16.0),
    ("Assigned BDE", 18.0),
    ("Comments", 30.0),
    ("Created At", 18.0),
];

const STATUS_COLUMN: u16 = 7;

impl ExportService {
    fn or_dash(value: Option<&str>) -> String {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => "-".to_string(),
        }
    }

    fn status_color(status: &str) -> Option<Color> {
        match status.parse::<LeadStatus>().ok()? {
            LeadStatus::New => Some(Color::RGB(0x1A56DB)),
            LeadStatus::InProgress => Some(Color::RGB(0xF59E0B)),
            LeadStatus::Closed => Some(Color::RGB(0x10B981)),
        }
    }

    /// Text of every column for one lead, in sheet order (the id column excluded).
    pub fn row_text(lead: &LeadWithAssignee) -> [String; 11] {
        let l = &lead.lead;
        [
            l.name.clone(),
            Self::or_dash(l.email.as_deref()),
            Self::or_dash(l.phone.as_deref()),
            l.source.clone(),
            Self::or_dash(l.project_type.as_deref()),
            Self::or_dash(l.budget.as_deref()),
            l.status.clone(),
            l.follow_up_date
                .map(|d| d.format("%d %b %Y").to_string())
                .unwrap_or_else(|| "-".to_string()),
            Self::or_dash(lead.assignee_name.as_deref()),
            Self::or_dash(l.comment.as_deref()),
            l.created_at.format("%d %b %Y %H:%M").to_string(),
        ]
    }

    pub fn file_name(day: NaiveDate) -> String {
        format!("Leads-{}.xlsx", day.format("%Y-%m-%d"))
    }

    /// Styled workbook with one `Leads` sheet.
    pub fn generate_leads_xlsx(leads: &[LeadWithAssignee]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let properties = DocProperties::new()
            .set_title("Leads")
            .set_author("Lead CRM");
        workbook.set_properties(&properties);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Leads")?;
        worksheet.set_landscape();
        worksheet.set_print_fit_to_pages(1, 0);

        let border_color = Color::RGB(0xD0D7E2);
        let shade = Color::RGB(0xF5F7FF);

        for (i, (_, width)) in COLUMNS.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let header_format = Format::new()
            .set_bold()
            .set_font_size(11)
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(0x1A56DB))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        worksheet.set_row_height(0, 25)?;
        for (i, (name, _)) in COLUMNS.iter().enumerate() {
            worksheet.write_string_with_format(0, i as u16, *name, &header_format)?;
        }

        for (idx, lead) in leads.iter().enumerate() {
            let row = 1 + idx as u32;

            // Excel rows 2, 4, 6... are shaded.
            let mut base = Format::new()
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color)
                .set_align(FormatAlign::VerticalCenter);
            if idx % 2 == 0 {
                base = base.set_background_color(shade);
            }

            worksheet.write_number_with_format(row, 0, lead.lead.id as f64, &base)?;

            for (offset, text) in Self::row_text(lead).iter().enumerate() {
                let col = offset as u16 + 1;
                if col == STATUS_COLUMN {
                    let status_format = match Self::status_color(text) {
                        Some(color) => base.clone().set_bold().set_font_color(color),
                        None => base.clone(),
                    };
                    worksheet.write_string_with_format(row, col, text, &status_format)?;
                } else {
                    worksheet.write_string_with_format(row, col, text, &base)?;
                }
            }
        }

        worksheet.autofilter(0, 0, 0, (COLUMNS.len() - 1) as u16)?;
        worksheet.set_freeze_panes(1, 0)?;

        let buffer = workbook.save_to_buffer()?;
        tracing::info!(rows = leads.len(), bytes = buffer.len(), "Lead workbook generated");
        Ok(buffer)
    }
}
