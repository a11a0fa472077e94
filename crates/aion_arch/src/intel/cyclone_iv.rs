//! Intel (Altera) Cyclone IV E device model and technology mapper.
//!
//! The Cyclone IV E family uses 60nm logic elements (LEs), each containing a
//! single 4-input LUT and one flip-flop. Memory is provided by M9K blocks
//! (9,216 bits each, max 36-bit width) and DSP operations use embedded 18x18
//! multiplier blocks. The Cyclone IV E is a popular hobbyist and educational
//! FPGA family, with the EP4CE22F17C6N being one of the most widely used parts
//! (featured on the DE0-Nano and many other development boards).

use crate::tech_map::{ArithmeticPattern, LutMapping, MapResult, MemoryCell, TechMapper};
use crate::types::ResourceUsage;
use crate::Architecture;
use aion_ir::CellKind;

/// Device parameters for a specific Cyclone IV E part number.
struct CycloneIvDevice {
    /// Part number string (e.g., "EP4CE22F17C6N").
    name: &'static str,
    /// Number of logic elements (each LE = 1 LUT4 + 1 FF).
    les: u32,
    /// Number of M9K memory blocks.
    m9k: u32,
    /// Number of embedded 18x18 multipliers.
    multipliers: u32,
    /// Number of user I/O pins.
    io: u32,
    /// Number of PLLs.
    pll: u32,
}

/// Known Cyclone IV E device variants.
const CYCLONE_IV_DEVICES: &[CycloneIvDevice] = &[
    CycloneIvDevice {
        name: "EP4CE6E22C8N",
        les: 6_272,
        m9k: 30,
        multipliers: 15,
        io: 91,
        pll: 2,
    },
    CycloneIvDevice {
        name: "EP4CE10F17C8N",
        les: 10_320,
        m9k: 46,
        multipliers: 23,
        io: 136,
        pll: 2,
    },
    CycloneIvDevice {
        name: "EP4CE22F17C6N",
        les: 22_320,
        m9k: 66,
        multipliers: 66,
        io: 154,
        pll: 4,
    },
    CycloneIvDevice {
        name: "EP4CE55F23C8N",
        les: 55_856,
        m9k: 260,
        multipliers: 154,
        io: 325,
        pll: 4,
    },
    CycloneIvDevice {
        name: "EP4CE115F29C7N",
        les: 114_480,
        m9k: 432,
        multipliers: 266,
        io: 528,
        pll: 4,
    },
];

/// The smallest Cyclone IV device, used as fallback for unknown part numbers.
const FALLBACK_INDEX: usize = 0;

/// Architecture model for the Intel (Altera) Cyclone IV E FPGA family.
///
/// Each logic element (LE) contains a single 4-input LUT and one flip-flop,
/// so `total_luts()` and `total_ffs()` both equal the LE count. The Cyclone IV
/// uses a simpler architecture than the Cyclone V's ALM-based design, making
/// it easier to learn but less resource-efficient per area.
#[derive(Debug)]
pub struct CycloneIv {
    /// Index into `CYCLONE_IV_DEVICES` for the selected part.
    device_index: usize,
}

impl CycloneIv {
    /// Creates a Cyclone IV architecture for the given device part number.
    ///
    /// If the exact part number is not found, falls back to the smallest
    /// known device (EP4CE6E22C8N).
    pub fn new(device: &str) -> (Self, bool) {
        let index = CYCLONE_IV_DEVICES
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(device));
        match index {
            Some(i) => (Self { device_index: i }, true),
            None => (
                Self {
                    device_index: FALLBACK_INDEX,
                },
                false,
            ),
        }
    }

    /// Returns the device parameters for the selected part.
    fn device(&self) -> &CycloneIvDevice {
        &CYCLONE_IV_DEVICES[self.device_index]
    }
}

impl Architecture for CycloneIv {
    fn family_name(&self) -> &str {
        "cyclone_iv"
    }

    fn device_name(&self) -> &str {
        self.device().name
    }

    fn total_luts(&self) -> u32 {
        // Each LE contains one 4-input LUT
        self.device().les
    }

    fn total_ffs(&self) -> u32 {
        // Each LE contains one flip-flop
        self.device().les
    }

    fn total_bram(&self) -> u32 {
        self.device().m9k
    }

    fn total_dsp(&self) -> u32 {
        self.device().multipliers
    }

    fn total_io(&self) -> u32 {
        self.device().io
    }

    fn total_pll(&self) -> u32 {
        self.device().pll
    }

    fn lut_input_count(&self) -> u32 {
        4
    }

    fn resource_summary(&self) -> ResourceUsage {
        let dev = self.device();
        ResourceUsage {
            luts: dev.les,
            ffs: dev.les,
            bram: dev.m9k,
            dsp: dev.multipliers,
            io: dev.io,
            pll: dev.pll,
        }
    }

    fn tech_mapper(&self) -> Box<dyn TechMapper> {
        Box::new(CycloneIvMapper)
    }
}

/// Technology mapper for Intel (Altera) Cyclone IV E devices.
///
/// Maps generic IR cells to Cyclone IV primitives. LEs use 4-input LUTs,
/// M9K blocks have 9,216 bits capacity (max 36-bit width), and embedded
/// multipliers support 18x18 multiplication.
#[derive(Debug)]
pub struct CycloneIvMapper;

impl CycloneIvMapper {
    /// M9K block capacity in bits.
    const M9K_DEPTH: u32 = 9_216;
    /// M9K maximum data width in bits.
    const M9K_MAX_WIDTH: u32 = 36;
    /// Embedded multiplier maximum A operand width.
    const DSP_MAX_WIDTH_A: u32 = 18;
    /// Embedded multiplier maximum B operand width.
    const DSP_MAX_WIDTH_B: u32 = 18;

    /// Generates a LUT truth table for a 2-input AND gate.
    fn and2_truth_table() -> Vec<u8> {
        // 2-input AND: 00->0, 01->0, 10->0, 11->1 = 0b1000 = 0x8
        vec![0x08]
    }

    /// Generates a LUT truth table for a 2-input OR gate.
    fn or2_truth_table() -> Vec<u8> {
        // 2-input OR: 00->0, 01->1, 10->1, 11->1 = 0b1110 = 0xE
        vec![0x0E]
    }

    /// Generates a LUT truth table for a 2-input XOR gate.
    fn xor2_truth_table() -> Vec<u8> {
        // 2-input XOR: 00->0, 01->1, 10->1, 11->0 = 0b0110 = 0x6
        vec![0x06]
    }

    /// Generates a LUT truth table for a 1-input NOT gate.
    fn not1_truth_table() -> Vec<u8> {
        // 1-input NOT: 0->1, 1->0 = 0b01 = 0x1
        vec![0x01]
    }
}

impl TechMapper for CycloneIvMapper {
    fn map_cell(&self, cell_kind: &CellKind) -> MapResult {
        match cell_kind {
            CellKind::And { width } => {
                let luts: Vec<LutMapping> = (0..*width)
                    .map(|_| LutMapping {
                        input_count: 2,
                        init_bits: Self::and2_truth_table(),
                    })
                    .collect();
                MapResult::Luts(luts)
            }
            CellKind::Or { width } => {
                let luts: Vec<LutMapping> = (0..*width)
                    .map(|_| LutMapping {
                        input_count: 2,
                        init_bits: Self::or2_truth_table(),
                    })
                    .collect();
                MapResult::Luts(luts)
            }
            CellKind::Xor { width } => {
                let luts: Vec<LutMapping> = (0..*width)
                    .map(|_| LutMapping {
                        input_count: 2,
                        init_bits: Self::xor2_truth_table(),
                    })
                    .collect();
                MapResult::Luts(luts)
            }
            CellKind::Not { width } => {
                let luts: Vec<LutMapping> = (0..*width)
                    .map(|_| LutMapping {
                        input_count: 1,
                        init_bits: Self::not1_truth_table(),
                    })
                    .collect();
                MapResult::Luts(luts)
            }
            CellKind::Dff { .. } | CellKind::Latch { .. } => MapResult::Ff,
            CellKind::Bram(_) => MapResult::Bram,
            CellKind::Dsp(_) => MapResult::Dsp,
            CellKind::Lut { .. }
            | CellKind::Carry { .. }
            | CellKind::Pll(_)
            | CellKind::Iobuf(_) => MapResult::PassThrough,
            _ => MapResult::Unmappable,
        }
    }

    fn infer_bram(&self, memory: &MemoryCell) -> bool {
        let total_bits = memory.depth as u64 * memory.width as u64;
        total_bits <= Self::M9K_DEPTH as u64 * Self::M9K_MAX_WIDTH as u64
            && memory.width <= Self::M9K_MAX_WIDTH
    }

    fn infer_dsp(&self, pattern: &ArithmeticPattern) -> bool {
        pattern.width_a <= Self::DSP_MAX_WIDTH_A && pattern.width_b <= Self::DSP_MAX_WIDTH_B
    }

    fn map_to_luts(&self, cell_kind: &CellKind) -> Vec<LutMapping> {
        match self.map_cell(cell_kind) {
            MapResult::Luts(luts) => luts,
            _ => Vec::new(),
        }
    }

    fn lut_input_count(&self) -> u32 {
        4
    }

    fn max_bram_depth(&self) -> u32 {
        Self::M9K_DEPTH
    }

    fn max_bram_width(&self) -> u32 {
        Self::M9K_MAX_WIDTH
    }

    fn max_dsp_width_a(&self) -> u32 {
        Self::DSP_MAX_WIDTH_A
    }

    fn max_dsp_width_b(&self) -> u32 {
        Self::DSP_MAX_WIDTH_B
    }
}
