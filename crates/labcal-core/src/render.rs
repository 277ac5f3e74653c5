use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::clock::format_hour_label;
use crate::event::Event;
use crate::grid::{CalendarView, MonthGrid, TimeGrid};

const CELL_WIDTH: usize = 20;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    /// Colour is only used when asked for and stdout is a terminal.
    pub fn new(color: bool) -> Self {
        Self {
            color: color && io::stdout().is_terminal(),
        }
    }

    #[tracing::instrument(skip(self, out, view))]
    pub fn write_view<W: Write>(
        &self,
        mut out: W,
        title: &str,
        view: &CalendarView<'_>,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(title, "1"))?;
        writeln!(out)?;
        match view {
            CalendarView::Month(grid) => self.write_month(&mut out, grid),
            CalendarView::Week(grid) | CalendarView::Day(grid) => self.write_time_grid(&mut out, grid),
        }
    }

    fn write_month<W: Write>(&self, out: &mut W, grid: &MonthGrid<'_>) -> anyhow::Result<()> {
        for label in grid.weekday_labels {
            write!(out, "{}", pad(label, CELL_WIDTH))?;
        }
        writeln!(out)?;
        writeln!(out, "{}", "-".repeat(CELL_WIDTH * 7))?;

        for row in grid.rows() {
            let lines = row
                .iter()
                .map(|cell| cell.inline_events().len() + usize::from(cell.overflow_count > 0))
                .max()
                .unwrap_or(0)
                + 1;

            for line in 0..lines {
                for cell in row {
                    let text = match cell.date {
                        None => String::new(),
                        Some(date) if line == 0 => {
                            let marker = match (cell.is_today, cell.is_selected) {
                                (true, _) => "*",
                                (false, true) => ">",
                                _ => "",
                            };
                            format!("{marker}{}", date.format("%-d"))
                        }
                        Some(_) => {
                            let inline = cell.inline_events();
                            match inline.get(line - 1) {
                                Some(event) => format!("{} {}", event.start_time, event.title),
                                None if line - 1 == inline.len() && cell.overflow_count > 0 => {
                                    format!("+{} more", cell.overflow_count)
                                }
                                None => String::new(),
                            }
                        }
                    };

                    let text = truncate(&text, CELL_WIDTH - 1);
                    let padded = pad(&text, CELL_WIDTH);
                    let painted = if line == 0 && cell.is_today {
                        self.paint(&padded, "33")
                    } else {
                        padded
                    };
                    write!(out, "{painted}")?;
                }
                writeln!(out)?;
            }
        }

        Ok(())
    }

    fn write_time_grid<W: Write>(&self, out: &mut W, grid: &TimeGrid<'_>) -> anyhow::Result<()> {
        let label_width = format_hour_label(10).width();
        let headers: Vec<String> = std::iter::once(String::new())
            .chain(grid.day_headers.iter().map(|header| {
                if header.is_today {
                    self.paint(&header.label, "33")
                } else {
                    header.label.clone()
                }
            }))
            .collect();

        let mut rows = Vec::with_capacity(grid.hour_rows.len());
        for row in &grid.hour_rows {
            let mut cells = vec![pad(&row.label, label_width)];
            for column in &row.columns {
                let text = column
                    .events
                    .iter()
                    .map(|placed| {
                        format!(
                            "{}-{} {} [top {} h {}]",
                            placed.event.start_time,
                            placed.event.end_time,
                            placed.event.title,
                            placed.top,
                            placed.height
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                cells.push(text);
            }
            rows.push(cells);
        }

        write_table(out, headers, rows)
    }

    /// Details for a single event, as shown when it is picked.
    pub fn write_event<W: Write>(&self, mut out: W, event: &Event) -> anyhow::Result<()> {
        writeln!(out, "id        {}", event.id)?;
        writeln!(out, "title     {}", self.paint(&event.title, "1"))?;
        writeln!(out, "date      {}", event.date.format("%A, %B %-d, %Y"))?;
        writeln!(
            out,
            "time      {} - {}",
            event.start_time.to_12h(),
            event.end_time.to_12h()
        )?;
        if !event.location.is_empty() {
            writeln!(out, "location  {}", event.location)?;
        }
        if !event.attendees.is_empty() {
            writeln!(out, "attendees {}", event.attendees)?;
        }
        if !event.description.is_empty() {
            writeln!(out, "notes     {}", event.description)?;
        }
        writeln!(
            out,
            "reminder  {}",
            if event.reminder_set { "on" } else { "off" }
        )?;
        Ok(())
    }

    fn paint(&self, text: &str, sgr: &str) -> String {
        if self.color {
            format!("\x1b[{sgr}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

fn pad(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(strip_ansi(text).as_str());
    format!("{text}{}", " ".repeat(width.saturating_sub(visible)))
}

fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out.push('…');
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(header).as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        write!(writer, "{} ", pad(header, widths[idx]))?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            write!(writer, "{} ", pad(cell, widths[idx]))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Drops `ESC [ ... <final>` sequences so padding counts visible columns.
fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\x1b' {
            out.push(ch);
            continue;
        }
        if chars.next() == Some('[') {
            for param in chars.by_ref() {
                if ('@'..='~').contains(&param) {
                    break;
                }
            }
        }
    }
    out
}
