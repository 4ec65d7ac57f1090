//! 80x25 VGA text console.
//!
//! [`Writer`] holds the cursor and colour and works over any [`TextBuffer`];
//! the kernel uses the memory-mapped one at 0xB8000 and the tests use a plain
//! array. [`VGA_CONSOLE`] is the instance registered as the diagnostic
//! console.

use core::fmt;
use core::ptr::{read_volatile, write_volatile};

use cascade_core::Console;
use cascade_lib::klog_debug;
use spin::{Mutex, Once};

pub const VGA_WIDTH: usize = 80;
pub const VGA_HEIGHT: usize = 25;
pub const VGA_CELLS: usize = VGA_WIDTH * VGA_HEIGHT;

/// Physical address of colour text memory.
pub const VGA_TEXT_BUFFER: usize = 0xB8000;

/// Shown in place of bytes the code page can't be trusted to render.
const REPLACEMENT_GLYPH: u8 = 0xFE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Colour {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    LightGray = 7,
    DarkGray = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    Pink = 13,
    Yellow = 14,
    White = 15,
}

/// Attribute byte: background in the high nibble, foreground in the low.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColourCode(pub u8);

impl ColourCode {
    /// White on black.
    pub const DEFAULT: Self = Self::new(Colour::White, Colour::Black);

    pub const fn new(foreground: Colour, background: Colour) -> Self {
        Self(((background as u8) << 4) | foreground as u8)
    }
}

#[inline]
pub const fn cell(byte: u8, colour: ColourCode) -> u16 {
    ((colour.0 as u16) << 8) | byte as u16
}

/// Linear array of character cells, row-major.
pub trait TextBuffer {
    fn read_cell(&self, index: usize) -> u16;
    fn write_cell(&mut self, index: usize, value: u16);
}

impl TextBuffer for [u16; VGA_CELLS] {
    fn read_cell(&self, index: usize) -> u16 {
        self[index]
    }

    fn write_cell(&mut self, index: usize, value: u16) {
        self[index] = value;
    }
}

/// The memory-mapped text buffer.
pub struct VgaMemory {
    base: *mut u16,
}

// SAFETY: the buffer is only reached through the `Mutex` around `Writer`.
unsafe impl Send for VgaMemory {}

impl VgaMemory {
    /// # Safety
    /// Text memory must be identity-mapped at [`VGA_TEXT_BUFFER`] and not be
    /// written through any other handle.
    pub const unsafe fn new() -> Self {
        Self {
            base: VGA_TEXT_BUFFER as *mut u16,
        }
    }
}

impl TextBuffer for VgaMemory {
    fn read_cell(&self, index: usize) -> u16 {
        debug_assert!(index < VGA_CELLS);
        // SAFETY: in bounds of the 80x25 buffer promised by `new`.
        unsafe { read_volatile(self.base.add(index)) }
    }

    fn write_cell(&mut self, index: usize, value: u16) {
        debug_assert!(index < VGA_CELLS);
        // SAFETY: in bounds of the 80x25 buffer promised by `new`.
        unsafe { write_volatile(self.base.add(index), value) }
    }
}

pub struct Writer<B: TextBuffer> {
    buffer: B,
    column: usize,
    row: usize,
    colour: ColourCode,
}

impl<B: TextBuffer> Writer<B> {
    pub const fn new(buffer: B) -> Self {
        Self {
            buffer,
            column: 0,
            row: 0,
            colour: ColourCode::DEFAULT,
        }
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// `(column, row)` of the next cell written.
    pub fn cursor(&self) -> (usize, usize) {
        (self.column, self.row)
    }

    pub fn colour(&self) -> ColourCode {
        self.colour
    }

    pub fn set_colour(&mut self, colour: ColourCode) {
        self.colour = colour;
    }

    /// Blank the screen in the current colour and home the cursor.
    pub fn clear(&mut self) {
        let blank = cell(b' ', self.colour);
        for index in 0..VGA_CELLS {
            self.buffer.write_cell(index, blank);
        }
        self.column = 0;
        self.row = 0;
    }

    pub fn write_byte(&mut self, byte: u8) {
        if byte == b'\n' {
            self.new_line();
            return;
        }
        let index = self.row * VGA_WIDTH + self.column;
        self.buffer.write_cell(index, cell(byte, self.colour));
        self.column += 1;
        if self.column >= VGA_WIDTH {
            self.new_line();
        }
    }

    pub fn write_string(&mut self, s: &str) {
        for byte in s.bytes() {
            match byte {
                0x20..=0x7E | b'\n' => self.write_byte(byte),
                _ => self.write_byte(REPLACEMENT_GLYPH),
            }
        }
    }

    /// Place one cell without moving the cursor. Off-screen positions are
    /// ignored.
    pub fn put_at(&mut self, x: usize, y: usize, byte: u8, colour: ColourCode) {
        if x >= VGA_WIDTH || y >= VGA_HEIGHT {
            return;
        }
        self.buffer.write_cell(y * VGA_WIDTH + x, cell(byte, colour));
    }

    fn new_line(&mut self) {
        self.column = 0;
        if self.row + 1 < VGA_HEIGHT {
            self.row += 1;
            return;
        }
        for index in VGA_WIDTH..VGA_CELLS {
            let value = self.buffer.read_cell(index);
            self.buffer.write_cell(index - VGA_WIDTH, value);
        }
        let blank = cell(b' ', self.colour);
        for index in VGA_CELLS - VGA_WIDTH..VGA_CELLS {
            self.buffer.write_cell(index, blank);
        }
    }
}

impl<B: TextBuffer> fmt::Write for Writer<B> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_string(s);
        Ok(())
    }
}

static VGA: Once<Mutex<Writer<VgaMemory>>> = Once::new();

/// Take over text memory, clear it white-on-black. Idempotent.
pub fn vga_init() {
    VGA.call_once(|| {
        // SAFETY: no paging, so 0xB8000 is identity-mapped, and this `Once`
        // is the only place a handle to it is created.
        let mut writer = Writer::new(unsafe { VgaMemory::new() });
        writer.clear();
        Mutex::new(writer)
    });
    klog_debug!("vga: {}x{} text console ready", VGA_WIDTH, VGA_HEIGHT);
}

fn with_writer(f: impl FnOnce(&mut Writer<VgaMemory>)) {
    if let Some(vga) = VGA.get()
        && let Some(mut writer) = vga.try_lock()
    {
        f(&mut writer);
    }
}

pub fn vga_clear() {
    with_writer(|writer| writer.clear());
}

pub fn vga_set_colour(colour: ColourCode) {
    with_writer(|writer| writer.set_colour(colour));
}

pub fn vga_put_at(x: usize, y: usize, byte: u8, colour: ColourCode) {
    with_writer(|writer| writer.put_at(x, y, byte, colour));
}

/// Diagnostic console backed by the VGA writer.
///
/// Output that arrives while the writer is held (an exception raised in the
/// middle of a write) is dropped rather than deadlocking.
pub struct VgaConsole;

impl Console for VgaConsole {
    fn write_str(&self, s: &str) {
        with_writer(|writer| writer.write_string(s));
    }
}

pub static VGA_CONSOLE: VgaConsole = VgaConsole;

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    fn writer() -> Writer<[u16; VGA_CELLS]> {
        Writer::new([0; VGA_CELLS])
    }

    fn glyph(writer: &Writer<[u16; VGA_CELLS]>, x: usize, y: usize) -> u8 {
        writer.buffer()[y * VGA_WIDTH + x] as u8
    }

    #[test]
    fn default_colour_is_white_on_black() {
        assert_eq!(ColourCode::DEFAULT.0, 0x0F);
        assert_eq!(ColourCode::new(Colour::Yellow, Colour::Blue).0, 0x1E);
        assert_eq!(cell(b'A', ColourCode::DEFAULT), 0x0F41);
    }

    #[test]
    fn text_advances_the_cursor_and_wraps_lines() {
        let mut w = writer();
        w.write_string("hi\nyo");
        assert_eq!(glyph(&w, 0, 0), b'h');
        assert_eq!(glyph(&w, 1, 0), b'i');
        assert_eq!(glyph(&w, 0, 1), b'y');
        assert_eq!(w.cursor(), (2, 1));

        let mut w = writer();
        for _ in 0..VGA_WIDTH {
            w.write_byte(b'x');
        }
        assert_eq!(w.cursor(), (0, 1));
    }

    #[test]
    fn writing_past_the_last_row_scrolls() {
        let mut w = writer();
        w.clear();
        for row in 0..VGA_HEIGHT {
            writeln!(w, "{}", row % 10).unwrap();
        }
        assert_eq!(w.cursor(), (0, VGA_HEIGHT - 1));
        assert_eq!(glyph(&w, 0, 0), b'1');
        assert_eq!(glyph(&w, 0, VGA_HEIGHT - 2), b'4');
        assert_eq!(glyph(&w, 0, VGA_HEIGHT - 1), b' ');
    }

    #[test]
    fn clear_fills_with_blanks_in_the_current_colour() {
        let mut w = writer();
        w.write_string("junk");
        w.set_colour(ColourCode::new(Colour::Green, Colour::Black));
        w.clear();
        assert_eq!(w.cursor(), (0, 0));
        assert!(w.buffer().iter().all(|&c| c == 0x0220));
    }

    #[test]
    fn put_at_leaves_the_cursor_alone() {
        let mut w = writer();
        let red = ColourCode::new(Colour::Red, Colour::Black);
        w.put_at(79, 24, b'@', red);
        w.put_at(80, 0, b'!', red);
        w.put_at(0, 25, b'!', red);
        assert_eq!(w.buffer()[VGA_CELLS - 1], cell(b'@', red));
        assert_eq!(w.cursor(), (0, 0));
        assert_eq!(w.buffer().iter().filter(|&&c| c != 0).count(), 1);
    }

    #[test]
    fn unprintable_bytes_become_the_replacement_glyph() {
        let mut w = writer();
        w.write_string("a\té");
        assert_eq!(glyph(&w, 0, 0), b'a');
        assert_eq!(glyph(&w, 1, 0), REPLACEMENT_GLYPH);
        assert_eq!(glyph(&w, 2, 0), REPLACEMENT_GLYPH);
        assert_eq!(glyph(&w, 3, 0), REPLACEMENT_GLYPH);
    }
}
