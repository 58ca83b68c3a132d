//! Character-cell drawing surface for the scope.
//!
//! The renderer draws with a handful of curses-style primitives. [`TerminalSurface`]
//! implements them on an off-screen ratatui buffer and submits the whole buffer as one
//! frame on [`Surface::refresh`]. Anything drawn outside the viewport is clipped.

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    buffer::Buffer,
    layout::{Rect, Size},
    style::Style,
    Terminal,
};
use std::io::{self, Stdout};

/// Drawing capability used by the renderer.
pub trait Surface {
    /// Viewport dimensions in cells.
    fn size(&self) -> Size;

    /// Blanks the whole surface.
    fn clear(&mut self);

    /// Draws `len` copies of `ch` downward starting at (`x`, `y`).
    fn vline(&mut self, x: i32, y: i32, ch: char, len: i32);

    /// Draws `len` copies of `ch` rightward starting at (`x`, `y`).
    fn hline(&mut self, x: i32, y: i32, ch: char, len: i32);

    /// Writes `text` starting at (`x`, `y`).
    fn put_str(&mut self, x: i32, y: i32, text: &str);

    /// Submits everything drawn since the last clear.
    fn refresh(&mut self) -> anyhow::Result<()>;
}

/// [`Surface`] backed by a ratatui terminal.
pub struct TerminalSurface<B: Backend> {
    terminal: Terminal<B>,
    canvas: Buffer,
    /// Raw mode and the alternate screen are active and must be undone
    owns_tty: bool,
}

impl TerminalSurface<CrosstermBackend<Stdout>> {
    /// Takes over the real terminal: raw mode, alternate screen, hidden cursor.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If the alternate screen cannot be entered
    /// - If the terminal size cannot be read
    pub fn open() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }

        let terminal = Terminal::new(CrosstermBackend::new(stdout)).map_err(anyhow::Error::from);
        match terminal.and_then(Self::new) {
            Ok(mut surface) => {
                surface.owns_tty = true;
                Ok(surface)
            }
            Err(e) => {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
                Err(e)
            }
        }
    }
}

impl<B: Backend> TerminalSurface<B> {
    /// Wraps a terminal. The viewport is measured once, here.
    pub fn new(terminal: Terminal<B>) -> anyhow::Result<Self> {
        let size = terminal.size()?;
        let canvas = Buffer::empty(Rect::new(0, 0, size.width, size.height));
        Ok(Self {
            terminal,
            canvas,
            owns_tty: false,
        })
    }

    /// Gives the terminal back to the shell. Safe to call more than once.
    pub fn restore(&mut self) -> anyhow::Result<()> {
        if !self.owns_tty {
            return Ok(());
        }
        self.owns_tty = false;
        disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen, Show)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    fn set(&mut self, x: i32, y: i32, ch: char) {
        let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
            return;
        };
        if let Some(cell) = self.canvas.cell_mut((x, y)) {
            cell.set_char(ch);
        }
    }
}

impl<B: Backend> Surface for TerminalSurface<B> {
    fn size(&self) -> Size {
        Size {
            width: self.canvas.area.width,
            height: self.canvas.area.height,
        }
    }

    fn clear(&mut self) {
        self.canvas.reset();
    }

    fn vline(&mut self, x: i32, y: i32, ch: char, len: i32) {
        for row in y..y.saturating_add(len) {
            self.set(x, row, ch);
        }
    }

    fn hline(&mut self, x: i32, y: i32, ch: char, len: i32) {
        for column in x..x.saturating_add(len) {
            self.set(column, y, ch);
        }
    }

    fn put_str(&mut self, x: i32, y: i32, text: &str) {
        let area = self.canvas.area;
        let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
            return;
        };
        if x >= area.right() || y >= area.bottom() {
            return;
        }
        self.canvas.set_string(x, y, text, Style::default());
    }

    fn refresh(&mut self) -> anyhow::Result<()> {
        let canvas = &self.canvas;
        self.terminal.draw(|frame| frame.buffer_mut().merge(canvas))?;
        Ok(())
    }
}

impl<B: Backend> Drop for TerminalSurface<B> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn surface(width: u16, height: u16) -> TerminalSurface<TestBackend> {
        TerminalSurface::new(Terminal::new(TestBackend::new(width, height)).unwrap()).unwrap()
    }

    fn row(surface: &TerminalSurface<TestBackend>, y: u16) -> String {
        let buffer = surface.terminal().backend().buffer();
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_size_is_viewport() {
        assert_eq!(
            surface(30, 12).size(),
            Size {
                width: 30,
                height: 12
            }
        );
    }

    #[test]
    fn test_nothing_visible_before_refresh() {
        let mut surface = surface(10, 3);
        surface.put_str(0, 0, "hello");
        assert_eq!(row(&surface, 0), " ".repeat(10));

        surface.refresh().unwrap();
        assert_eq!(row(&surface, 0), "hello     ");
    }

    #[test]
    fn test_lines_draw_and_clip() {
        let mut surface = surface(6, 4);
        surface.hline(2, 1, '-', 10);
        surface.vline(0, -2, '#', 10);
        surface.refresh().unwrap();

        assert_eq!(row(&surface, 0), "#     ");
        assert_eq!(row(&surface, 1), "#-----");
        assert_eq!(row(&surface, 3), "#     ");
    }

    #[test]
    fn test_out_of_bounds_text_is_dropped() {
        let mut surface = surface(5, 2);
        surface.put_str(-1, 0, "left");
        surface.put_str(0, 7, "below");
        surface.put_str(3, 1, "clipped");
        surface.refresh().unwrap();

        assert_eq!(row(&surface, 0), "     ");
        assert_eq!(row(&surface, 1), "   cl");
    }

    #[test]
    fn test_clear_blanks_next_frame() {
        let mut surface = surface(4, 1);
        surface.put_str(0, 0, "abcd");
        surface.refresh().unwrap();
        surface.clear();
        surface.refresh().unwrap();
        assert_eq!(row(&surface, 0), "    ");
    }
}
