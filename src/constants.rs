pub const MAX_DIGITS: u8 = 4;

pub const INTENSITY_MIN: u8 = 0x00;
pub const INTENSITY_TYP: u8 = 0x02;
pub const INTENSITY_MAX: u8 = 0x07; // 3 bits

/// Segment pattern with all seven segments lit; also the mask for raw writes.
pub const SEGMENTS_MASK: u8 = 0x7F;

/// Segment pattern for a blank digit.
pub const BLANK: u8 = 0x00;

// Wire address of the pseudo digit that drives the decimal points on the
// Gotek LEDC68 board (one past its three visible digits, segment d).
pub const LEDC68_DP_ADDR: u8 = 0x03;
pub const DP_ON: u8 = 0x08;
pub const DP_OFF: u8 = 0x00;

// LED segments:        a
//                    -----
//                  f|     |b
//                   |  g  |
//                    -----
//                  e|     |c
//                   |     |
//                    -----
//                      d
//   Register bits:
//      bit:  7  6  5  4  3  2  1  0
//            X  g  f  e  d  c  b  a
pub const CHAR_TABLE: [u8; 44] = [
    0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F, // 0-9
    0x77, 0x7C, 0x39, 0x5E, 0x79, 0x71, // A, b, C, d, E, F
    0x58, 0x6F, 0x74, 0x76, 0x1E, 0x38, // c, g, h, H, J, L
    0x54, 0x37, 0x73, 0x50, 0x1C, 0x3E, 0x6E, // n, N, P, r, u, U, y
    0x01, 0x40, 0x08, 0x00, 0x63, 0x5C, 0x46, 0x70, // dashes, space, boxes, borders
    0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, // single segments a-g
];

/// Segment pattern for a [`CHAR_TABLE`] index; anything past the table renders blank.
pub fn char_code(index: u8) -> u8 {
    CHAR_TABLE
        .get(index as usize)
        .copied()
        .unwrap_or(CHAR_TABLE[charmap::SPACE as usize])
}

pub mod cmd {
    pub const ADDR_AUTO: u8 = 0x40; // write with auto-increment addressing
    pub const ADDR_FIXED: u8 = 0x44; // write to one explicit address
    pub const DISPLAY_OFF: u8 = 0x80;
    pub const DISPLAY_ON: u8 = 0x88; // + brightness 0x00-0x07
    pub const ADDR_BASE: u8 = 0xC0; // + digit 0-3
}

/// [`CHAR_TABLE`] indices for the entries past the hexadecimal digits.
pub mod charmap {
    pub const LOWER_C: u8 = 16;
    pub const LOWER_G: u8 = 17;
    pub const LOWER_H: u8 = 18;
    pub const UPPER_H: u8 = 19;
    pub const UPPER_J: u8 = 20;
    pub const UPPER_L: u8 = 21;
    pub const LOWER_N: u8 = 22;
    pub const UPPER_N: u8 = 23;
    pub const UPPER_P: u8 = 24;
    pub const LOWER_R: u8 = 25;
    pub const LOWER_U: u8 = 26;
    pub const UPPER_U: u8 = 27;
    pub const LOWER_Y: u8 = 28;
    pub const UPPER_DASH: u8 = 29;
    pub const MIDDLE_DASH: u8 = 30;
    pub const LOWER_DASH: u8 = 31;
    pub const SPACE: u8 = 32;
    pub const UPPER_BOX: u8 = 33;
    pub const LOWER_BOX: u8 = 34;
    pub const LEFT_BORDER: u8 = 35;
    pub const RIGHT_BORDER: u8 = 36;
    pub const SEG_A: u8 = 37;
    pub const SEG_B: u8 = 38;
    pub const SEG_C: u8 = 39;
    pub const SEG_D: u8 = 40;
    pub const SEG_E: u8 = 41;
    pub const SEG_F: u8 = 42;
    pub const SEG_G: u8 = 43;
}
