//! Magic bitboard tables for sliding pieces.
//!
//! For every square a relevancy mask holds the squares whose occupancy can
//! shorten a ray (board edges excluded). The masked occupancy is hashed with
//! `(occ * magic) >> (64 - popcount(mask))` into a fixed-size slot array that
//! holds the true attack set for that blocker subset. Tables are built once,
//! on first use, and are read-only afterwards.

use crate::Bitboard;
use chess_core::Square;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Slots per square for bishop lookups.
pub const BISHOP_TABLE_SIZE: usize = 1 << 9;
/// Slots per square for rook lookups.
pub const ROOK_TABLE_SIZE: usize = 1 << 12;

const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Supplied bishop multipliers, one per square.
const BISHOP_MAGICS: [u64; 64] = [
    0x89a1121896040240,
    0x2004844802002010,
    0x2068080051921000,
    0x62880a0220200808,
    0x0004042004000000,
    0x0100822020200011,
    0xc00444222012000a,
    0x0028808801216001,
    0x0400492088408100,
    0x0201c401040c0084,
    0x00840800910a0010,
    0x0000082080240060,
    0x2000840504006000,
    0x30010c4108405004,
    0x1008005410080802,
    0x8144042209100900,
    0x0208081020014400,
    0x004800201208ca00,
    0x0f18140408012008,
    0x1004002802102001,
    0x0841000820080811,
    0x0040200200a42008,
    0x0000800054042000,
    0x88010400410c9000,
    0x0520040470104290,
    0x1004040051500081,
    0x2002081833080021,
    0x000400c00c010142,
    0x941408200c002000,
    0x0658810000806011,
    0x0188071040440a00,
    0x4800404002011c00,
    0x0104442040404200,
    0x0302091000210220,
    0x0004022401120400,
    0x80c0040400080120,
    0x8040010040820802,
    0x0480810700020090,
    0x0102008e00040242,
    0x0809005202050100,
    0x8002024220104080,
    0x0431008804142000,
    0x0019001802081400,
    0x0200014208040080,
    0x3308082008200100,
    0x041010500040c020,
    0x4012020c04210308,
    0x208220a202004080,
    0x0111040120082000,
    0x6803040141280a00,
    0x2101004202410000,
    0x8200000041108022,
    0x0000021082088000,
    0x0002410204010040,
    0x0040100400809000,
    0x0822088220820214,
    0x0040808090012004,
    0x00910224040218c9,
    0x0402814422015008,
    0x0090014004842410,
    0x0001000042304105,
    0x0010008830412a00,
    0x2520081090008908,
    0x40102000a0a60140,
];

/// Supplied rook multipliers, one per square.
const ROOK_MAGICS: [u64; 64] = [
    0x0a8002c000108020,
    0x06c00049b0002001,
    0x0100200010090040,
    0x2480041000800801,
    0x0280028004000800,
    0x0900410008040022,
    0x0280020001001080,
    0x2880002041000080,
    0xa000800080400034,
    0x0004808020004000,
    0x2290802004801000,
    0x0411000d00100020,
    0x0402800800040080,
    0x000b000401004208,
    0x2409000100040200,
    0x0001002100004082,
    0x0022878001e24000,
    0x1090810021004010,
    0x0801030040200012,
    0x0500808008001000,
    0x0a08018014000880,
    0x8000808004000200,
    0x0201008080010200,
    0x0801020000441091,
    0x0000800080204005,
    0x1040200040100048,
    0x0000120200402082,
    0x0d14880480100080,
    0x0012040280080080,
    0x0100040080020080,
    0x9020010080800200,
    0x0813241200148449,
    0x0491604001800080,
    0x0100401000402001,
    0x4820010021001040,
    0x0400402202000812,
    0x0209009005000802,
    0x0810800601800400,
    0x4301083214000150,
    0x204026458e001401,
    0x0040204000808000,
    0x8001008040010020,
    0x8410820820420010,
    0x1003001000090020,
    0x0804040008008080,
    0x0012000810020004,
    0x1000100200040208,
    0x430000a044020001,
    0x0280009023410300,
    0x00e0100040002240,
    0x0000200100401700,
    0x2244100408008080,
    0x0008000400801980,
    0x0002000810040200,
    0x8010100228810400,
    0x2000009044210200,
    0x4080008040102101,
    0x0040002080411d01,
    0x2005524060000901,
    0x0502001008400422,
    0x489a000810200402,
    0x0001004400080a13,
    0x4000011008020084,
    0x0026002114058042,
];

#[derive(Clone, Copy)]
enum Slider {
    Bishop,
    Rook,
}

impl Slider {
    fn name(self) -> &'static str {
        match self {
            Slider::Bishop => "bishop",
            Slider::Rook => "rook",
        }
    }

    fn directions(self) -> &'static [(i8, i8); 4] {
        match self {
            Slider::Bishop => &BISHOP_DIRECTIONS,
            Slider::Rook => &ROOK_DIRECTIONS,
        }
    }

    fn table_size(self) -> usize {
        match self {
            Slider::Bishop => BISHOP_TABLE_SIZE,
            Slider::Rook => ROOK_TABLE_SIZE,
        }
    }

    fn supplied_magic(self, sq: usize) -> u64 {
        match self {
            Slider::Bishop => BISHOP_MAGICS[sq],
            Slider::Rook => ROOK_MAGICS[sq],
        }
    }
}

/// Hashing parameters for one square.
#[derive(Clone, Copy, Default)]
struct Magic {
    mask: Bitboard,
    magic: u64,
    shift: u32,
}

impl Magic {
    #[inline]
    fn index(&self, occupied: Bitboard) -> usize {
        ((occupied.0 & self.mask.0).wrapping_mul(self.magic) >> self.shift) as usize
    }
}

/// Lookup tables for one slider kind: 64 magics and `64 * table_size` slots.
struct SliderTable {
    magics: [Magic; 64],
    attacks: Vec<Bitboard>,
    table_size: usize,
}

impl SliderTable {
    fn build(slider: Slider) -> Self {
        let table_size = slider.table_size();
        let mut magics = [Magic::default(); 64];
        let mut attacks = vec![Bitboard::EMPTY; 64 * table_size];

        for (idx, sq) in all_squares().enumerate() {
            let mask = relevancy_mask(sq, slider.directions());
            let shift = 64 - mask.count();
            let subsets = enumerate_subsets(sq, mask, slider.directions());

            let supplied = slider.supplied_magic(idx);
            let (magic, slots) = match fill_slots(&subsets, supplied, shift, table_size) {
                Some(slots) => (supplied, slots),
                None => {
                    warn!(square = %sq, piece = slider.name(), "supplied magic collides, searching");
                    find_magic(&subsets, shift, table_size, idx as u64)
                }
            };

            magics[idx] = Magic { mask, magic, shift };
            attacks[idx * table_size..(idx + 1) * table_size].copy_from_slice(&slots);
        }

        SliderTable {
            magics,
            attacks,
            table_size,
        }
    }

    #[inline]
    fn lookup(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let idx = sq.index() as usize;
        self.attacks[idx * self.table_size + self.magics[idx].index(occupied)]
    }
}

struct AttackTables {
    bishop: SliderTable,
    rook: SliderTable,
}

static TABLES: OnceLock<AttackTables> = OnceLock::new();

fn tables() -> &'static AttackTables {
    TABLES.get_or_init(|| {
        let tables = AttackTables {
            bishop: SliderTable::build(Slider::Bishop),
            rook: SliderTable::build(Slider::Rook),
        };
        info!("slider attack tables built");
        tables
    })
}

/// Builds the slider tables now instead of on the first lookup.
pub fn init() {
    tables();
}

/// Bishop attacks from `sq` given the board occupancy.
#[inline]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    tables().bishop.lookup(sq, occupied)
}

/// Rook attacks from `sq` given the board occupancy.
#[inline]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    tables().rook.lookup(sq, occupied)
}

#[inline]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

/// Bishop attacks computed by walking each diagonal. Slow; used to fill and
/// check the tables.
pub fn bishop_rays(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(sq, occupied, &BISHOP_DIRECTIONS)
}

/// Rook attacks computed by walking each line. Slow; used to fill and check
/// the tables.
pub fn rook_rays(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(sq, occupied, &ROOK_DIRECTIONS)
}

fn all_squares() -> impl Iterator<Item = Square> {
    (0..64u8).filter_map(Square::from_index)
}

fn on_board(file: i8, rank: i8) -> bool {
    (0..8).contains(&file) && (0..8).contains(&rank)
}

/// Walks each direction until the first blocker (inclusive) or the edge.
fn ray_attacks(sq: Square, occupied: Bitboard, directions: &[(i8, i8); 4]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    let (file, rank) = (sq.file().index() as i8, sq.rank().index() as i8);
    for &(df, dr) in directions {
        let (mut f, mut r) = (file + df, rank + dr);
        while on_board(f, r) {
            let bit = Bitboard(1u64 << (r * 8 + f));
            attacks |= bit;
            if (occupied & bit).is_not_empty() {
                break;
            }
            f += df;
            r += dr;
        }
    }
    attacks
}

/// Ray squares whose occupancy matters: each ray stops one short of the edge.
fn relevancy_mask(sq: Square, directions: &[(i8, i8); 4]) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    let (file, rank) = (sq.file().index() as i8, sq.rank().index() as i8);
    for &(df, dr) in directions {
        let (mut f, mut r) = (file + df, rank + dr);
        while on_board(f + df, r + dr) {
            mask |= Bitboard(1u64 << (r * 8 + f));
            f += df;
            r += dr;
        }
    }
    mask
}

/// Maps bit `i` of `index` to the `i`-th set bit of `mask`, lowest first.
fn subset_from_index(index: usize, mask: Bitboard) -> Bitboard {
    let mut subset = Bitboard::EMPTY;
    for (i, sq) in mask.into_iter().enumerate() {
        if index & (1 << i) != 0 {
            subset.set(sq);
        }
    }
    subset
}

/// Every blocker subset of `mask` paired with its true attack set.
fn enumerate_subsets(
    sq: Square,
    mask: Bitboard,
    directions: &[(i8, i8); 4],
) -> Vec<(Bitboard, Bitboard)> {
    (0..1usize << mask.count())
        .map(|index| {
            let occupied = subset_from_index(index, mask);
            (occupied, ray_attacks(sq, occupied, directions))
        })
        .collect()
}

/// Hashes every subset with `magic`. Returns `None` if two subsets with
/// different attack sets land in the same slot.
fn fill_slots(
    subsets: &[(Bitboard, Bitboard)],
    magic: u64,
    shift: u32,
    table_size: usize,
) -> Option<Vec<Bitboard>> {
    let mut slots: Vec<Option<Bitboard>> = vec![None; table_size];
    for &(occupied, attacks) in subsets {
        let index = (occupied.0.wrapping_mul(magic) >> shift) as usize;
        match slots[index] {
            Some(existing) if existing != attacks => return None,
            _ => slots[index] = Some(attacks),
        }
    }
    Some(slots.into_iter().map(Option::unwrap_or_default).collect())
}

/// Deterministic trial-and-error search for a working multiplier.
fn find_magic(
    subsets: &[(Bitboard, Bitboard)],
    shift: u32,
    table_size: usize,
    seed: u64,
) -> (u64, Vec<Bitboard>) {
    let mut rng = Xorshift(0x2545_F491_4F6C_DD1D ^ seed.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    loop {
        // Sparse candidates succeed far more often.
        let candidate = rng.next() & rng.next() & rng.next();
        if let Some(slots) = fill_slots(subsets, candidate, shift, table_size) {
            return (candidate, slots);
        }
    }
}

struct Xorshift(u64);

impl Xorshift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}
