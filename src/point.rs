//! Per-point prediction memory and the adaptive symbol coder.
//!
//! Each point carries three kinds of state: prediction slots (the successor
//! hint, two state-flags slots, three MRU-ordered value slots), a histogram
//! of recently coded symbols, and the currently installed prefix mode. The
//! encoder and decoder run identical copies of this state machine; any
//! divergence in the adaptation schedule desynchronizes the stream.

use crate::bitstream::{BitReader, BitWriter};
use crate::codes::CodeWord;
use crate::error::{DecodeError, EncodeError};

/// Raised when mode selection falls through every candidate. Impossible
/// with a well-formed histogram; kept as a corruption guard.
pub(crate) struct CodingViolation;

/// Prediction and coding state for a single point id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PointState {
    /// Predicted id of the record following this one.
    pub(crate) prev_next_point_id: u32,
    pub(crate) prev_state_flags1: u32,
    pub(crate) prev_state_flags2: u32,
    pub(crate) prev_value1: u32,
    pub(crate) prev_value2: u32,
    pub(crate) prev_value3: u32,

    command_stats: [u8; 32],
    commands_since_change: u32,

    // Active prefix mode and its short-prefix symbol slots. Mode 1 has no
    // prefix; mode N reserves N-1 hot slots.
    mode: u8,
    mode21: u8,
    mode31: u8,
    mode301: u8,
    mode41: u8,
    mode401: u8,
    mode4001: u8,
    startup_mode: u8,
}

impl PointState {
    /// A fresh state starts in mode 4 with the three value slots hot: at
    /// startup the most common symbols are value-slot hits.
    pub(crate) fn new(next_point_id: u32) -> Self {
        PointState {
            prev_next_point_id: next_point_id,
            prev_state_flags1: 0,
            prev_state_flags2: 0,
            prev_value1: 0,
            prev_value2: 0,
            prev_value3: 0,
            command_stats: [0; 32],
            commands_since_change: 0,
            mode: 4,
            mode21: 0,
            mode31: 0,
            mode301: 0,
            mode41: CodeWord::Value1.as_u8(),
            mode401: CodeWord::Value2.as_u8(),
            mode4001: CodeWord::Value3.as_u8(),
            startup_mode: 0,
        }
    }

    /// Spells `code` under the active mode and updates the histogram.
    pub(crate) fn write_code(
        &mut self,
        code: CodeWord,
        out: &mut BitWriter,
    ) -> Result<(), EncodeError> {
        let c = u32::from(code.as_u8());
        match self.mode {
            1 => out.write_bits(c, 5)?,
            2 => {
                if code.as_u8() == self.mode21 {
                    out.write_bits(1, 1)?;
                } else {
                    out.write_bits(c, 6)?;
                }
            }
            3 => {
                if code.as_u8() == self.mode31 {
                    out.write_bits(1, 1)?;
                } else if code.as_u8() == self.mode301 {
                    out.write_bits(1, 2)?;
                } else {
                    out.write_bits(c, 7)?;
                }
            }
            4 => {
                if code.as_u8() == self.mode41 {
                    out.write_bits(1, 1)?;
                } else if code.as_u8() == self.mode401 {
                    out.write_bits(1, 2)?;
                } else if code.as_u8() == self.mode4001 {
                    out.write_bits(1, 3)?;
                } else {
                    out.write_bits(c, 8)?;
                }
            }
            _ => return Err(EncodeError::CodingError),
        }

        self.update_statistics(code)
            .map_err(|CodingViolation| EncodeError::CodingError)
    }

    /// Reads one symbol under the active mode and updates the histogram.
    pub(crate) fn read_code(&mut self, input: &mut BitReader<'_>) -> Result<CodeWord, DecodeError> {
        let bits = match self.mode {
            1 => input.read_bits5()?,
            2 => {
                if input.read_bit()? == 1 {
                    u32::from(self.mode21)
                } else {
                    input.read_bits5()?
                }
            }
            3 => {
                if input.read_bit()? == 1 {
                    u32::from(self.mode31)
                } else if input.read_bit()? == 1 {
                    u32::from(self.mode301)
                } else {
                    input.read_bits5()?
                }
            }
            4 => {
                if input.read_bit()? == 1 {
                    u32::from(self.mode41)
                } else if input.read_bit()? == 1 {
                    u32::from(self.mode401)
                } else if input.read_bit()? == 1 {
                    u32::from(self.mode4001)
                } else {
                    input.read_bits5()?
                }
            }
            _ => return Err(DecodeError::CodingError),
        };

        let code = CodeWord::from_bits(bits);
        self.update_statistics(code)
            .map_err(|CodingViolation| DecodeError::CodingError)?;
        Ok(code)
    }

    /// Bumps the histogram and fires adaptation on the startup schedule:
    /// after 5 symbols, then 20, then every 100. The thresholds must match
    /// bit-for-bit between peers.
    fn update_statistics(&mut self, code: CodeWord) -> Result<(), CodingViolation> {
        self.commands_since_change += 1;
        self.command_stats[code.as_u8() as usize] += 1;

        match self.startup_mode {
            0 if self.commands_since_change > 5 => {
                self.startup_mode = 1;
                self.adapt()
            }
            1 if self.commands_since_change > 20 => {
                self.startup_mode = 2;
                self.adapt()
            }
            2 if self.commands_since_change > 100 => {
                self.startup_mode = 3;
                self.adapt()
            }
            3 if self.commands_since_change > 100 => self.adapt(),
            _ => Ok(()),
        }
    }

    /// Re-selects the mode and hot slots from the histogram, then zeroes it.
    ///
    /// The scan runs in symbol-index order with strict comparisons, so on
    /// equal counts the lower-indexed symbol takes the higher rank; ties in
    /// expected size resolve to the lower mode number. Both rules are
    /// load-bearing for encoder/decoder agreement.
    fn adapt(&mut self) -> Result<(), CodingViolation> {
        let mut code1 = 0u8;
        let mut count1 = 0u32;
        let mut code2 = 1u8;
        let mut count2 = 0u32;
        let mut code3 = 2u8;
        let mut count3 = 0u32;
        let mut total = 0u32;

        for (i, stat) in self.command_stats.iter_mut().enumerate() {
            let count = u32::from(*stat);
            *stat = 0;
            total += count;

            if count > count3 {
                if count > count1 {
                    code3 = code2;
                    count3 = count2;
                    code2 = code1;
                    count2 = count1;
                    code1 = i as u8;
                    count1 = count;
                } else if count > count2 {
                    code3 = code2;
                    count3 = count2;
                    code2 = i as u8;
                    count2 = count;
                } else {
                    code3 = i as u8;
                    count3 = count;
                }
            }
        }

        let mode1_size = total * 5;
        let mode2_size = count1 + (total - count1) * 6;
        let mode3_size = count1 + count2 * 2 + (total - count1 - count2) * 7;
        let mode4_size = count1 + count2 * 2 + count3 * 3 + (total - count1 - count2 - count3) * 8;

        let min_size = mode1_size.min(mode2_size).min(mode3_size).min(mode4_size);

        if min_size == mode1_size {
            self.mode = 1;
        } else if min_size == mode2_size {
            self.mode = 2;
            self.mode21 = code1;
        } else if min_size == mode3_size {
            self.mode = 3;
            self.mode31 = code1;
            self.mode301 = code2;
        } else if min_size == mode4_size {
            self.mode = 4;
            self.mode41 = code1;
            self.mode401 = code2;
            self.mode4001 = code3;
        } else {
            return Err(CodingViolation);
        }

        self.commands_since_change = 0;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn mode(&self) -> u8 {
        self.mode
    }

    #[cfg(test)]
    pub(crate) fn startup_mode(&self) -> u8 {
        self.startup_mode
    }

    #[cfg(test)]
    pub(crate) fn hot_slots(&self) -> [u8; 6] {
        [
            self.mode21,
            self.mode31,
            self.mode301,
            self.mode41,
            self.mode401,
            self.mode4001,
        ]
    }
}
