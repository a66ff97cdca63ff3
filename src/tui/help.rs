use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("Esc / Ctrl-C", 2, "Quit"),
        key_line("tab", 11, "Switch tabs"),
        Line::from(""),
        Line::from("Form tab:"),
        key_line("↑/↓", 11, "Move between X, Y, R and Submit"),
        key_line("←/→", 11, "Move between R options"),
        key_line("space / 1-5", 3, "Pick R"),
        key_line("Enter", 9, "Submit"),
        key_line("Ctrl-R", 8, "Reset form"),
        key_line("Ctrl-L", 8, "Clear history"),
        Line::from(""),
        Line::from("History tab:"),
        key_line("↑/↓ or j/k", 4, "Navigate"),
        key_line("e", 13, "Export history as JSON"),
        key_line("c", 13, "Export history as CSV"),
        key_line("x", 13, "Clear history"),
        key_line("q", 13, "Quit"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
