pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, Verdict},
    classifier::RiskLabel,
    palette::ColorName,
    scoring,
    session::Stage,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const DISCLAIMER: &str =
    "This screener is for educational purposes only and is not a medical diagnosis.";

pub fn ink_color(color: ColorName) -> Color {
    match color {
        ColorName::Red => Color::Red,
        ColorName::Green => Color::Green,
        ColorName::Blue => Color::Blue,
        ColorName::Yellow => Color::Yellow,
        ColorName::Purple => Color::Rgb(160, 32, 240),
        ColorName::Orange => Color::Rgb(255, 165, 0),
        ColorName::Pink => Color::Rgb(255, 105, 180),
        ColorName::Brown => Color::Rgb(139, 69, 19),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.stage() {
            Stage::Instructions => render_instructions(self, area, buf),
            Stage::Running => render_trial(self, area, buf),
            Stage::Finished => render_results(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_italic() -> Style {
    Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::ITALIC)
}

fn render_instructions(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(6),    // instructions
            Constraint::Length(3), // age prompt
            Constraint::Length(1), // message
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new("Stroop Test")
        .block(Block::default().borders(Borders::ALL))
        .style(bold().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let instructions = vec![
        Line::from(format!(
            "You will see {} color words, one at a time.",
            app.config.number_of_trials
        )),
        Line::from(Span::styled(
            "Name the INK color the word is drawn in, not the word itself.",
            bold(),
        )),
        Line::from("Press the number next to the ink color as quickly and accurately as you can."),
        Line::from(""),
        palette_legend(&app.config.palette),
    ];
    Paragraph::new(instructions)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);

    let range = app.test.age_range();
    Paragraph::new(Line::from(vec![
        Span::raw(format!("Enter your age ({}-{}): ", range.start(), range.end())),
        Span::styled(
            format!("{}_", app.age_input),
            bold().add_modifier(Modifier::UNDERLINED),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    render_message(app, chunks[3], buf);

    Paragraph::new(Span::styled("(enter) start / (r)estart / (esc)ape", dim_italic()))
        .render(chunks[4], buf);
}

fn render_trial(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.test.session();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // progress
            Constraint::Min(1),    // top padding
            Constraint::Length(1), // stimulus
            Constraint::Min(1),    // bottom padding
            Constraint::Length(1), // palette legend
            Constraint::Length(1), // message
        ])
        .split(area);

    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    Paragraph::new(Span::styled("(r)estart / (esc)ape", dim_italic())).render(header[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "Trial {}/{}",
            (session.current_index() + 1).min(session.number_of_trials()),
            session.number_of_trials()
        ),
        dim_italic(),
    ))
    .alignment(Alignment::Right)
    .render(header[1], buf);

    let stimulus = match app.test.current_trial() {
        Ok(trial) if !app.in_fixation() => {
            let word = trial.word.to_string();
            // letter-spaced so the ink reads clearly
            let spaced = word.chars().map(String::from).collect::<Vec<_>>().join(" ");
            let text = if spaced.width() <= chunks[2].width as usize {
                spaced
            } else {
                word
            };
            Span::styled(text, bold().fg(ink_color(trial.ink)))
        }
        _ => Span::styled("+", bold()),
    };
    Paragraph::new(stimulus)
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(palette_legend(&app.config.palette))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    render_message(app, chunks[5], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let responses = app.test.session().responses();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // interference
            Constraint::Length(3), // verdict
            Constraint::Length(1), // disclaimer
            Constraint::Length(1), // message
            Constraint::Length(1), // legend
        ])
        .split(area);

    let points = charting::reaction_points(responses);
    let (last_trial, slowest) = charting::compute_chart_params(&points);
    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("trial")
                .bounds([1.0, last_trial])
                .labels(vec![
                    Span::styled("1", bold()),
                    Span::styled(charting::format_label(last_trial), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, slowest])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(slowest), bold()),
                ]),
        )
        .render(chunks[0], buf);

    let stats = match app.test.summary() {
        Ok(summary) => format!(
            "{} correct   {} wrong   {:.2}s avg   {:.2} sd   score {}",
            summary.correct_count,
            summary.wrong_count,
            summary.avg_reaction_time,
            scoring::reaction_time_std_dev(responses).unwrap_or(0.0),
            summary.composite_score
        ),
        Err(e) => e.to_string(),
    };
    Paragraph::new(Span::styled(stats, bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let interference = match scoring::interference(responses) {
        Some(i) => format!(
            "interference {:+.2}s (congruent {:.2}s / incongruent {:.2}s)",
            i.effect, i.congruent_mean, i.incongruent_mean
        ),
        None => "interference n/a (needs congruent and incongruent trials)".to_string(),
    };
    Paragraph::new(Span::styled(
        interference,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let (verdict_text, verdict_style) = match &app.verdict {
        Some(Verdict::Assessed(a)) => match a.risk {
            RiskLabel::HighRisk => (
                "High probability of cognitive impairment".to_string(),
                bold().fg(Color::Red),
            ),
            RiskLabel::LowRisk => (
                "Low probability of cognitive impairment".to_string(),
                bold().fg(Color::Green),
            ),
        },
        Some(Verdict::ClassifierUnavailable(reason)) => (
            format!("Risk model unavailable: {reason}"),
            bold().fg(Color::Yellow),
        ),
        Some(Verdict::Failed(reason)) => {
            (format!("Assessment failed: {reason}"), bold().fg(Color::Red))
        }
        None => ("No assessment".to_string(), dim_italic()),
    };
    Paragraph::new(Span::styled(verdict_text, verdict_style))
        .block(Block::default().borders(Borders::ALL).title("Risk"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(DISCLAIMER, dim_italic()))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    render_message(app, chunks[5], buf);

    Paragraph::new(Span::styled(
        "(r)estart / (e)xport csv / (esc)ape",
        dim_italic(),
    ))
    .render(chunks[6], buf);
}

/// Response keys, drawn without ink so they give no hint
fn palette_legend(palette: &[ColorName]) -> Line<'static> {
    let spans = palette
        .iter()
        .enumerate()
        .flat_map(|(i, color)| {
            vec![
                Span::styled(format!("({})", i + 1), bold()),
                Span::raw(format!(" {color}   ")),
            ]
        })
        .collect::<Vec<Span>>();
    Line::from(spans)
}

fn render_message(app: &App, area: Rect, buf: &mut Buffer) {
    if let Some(message) = &app.message {
        Paragraph::new(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center)
        .render(area, buf);
    }
}
