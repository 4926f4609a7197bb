//! Waveform recording for harness runs.
//!
//! The [`WaveformRecorder`] trait abstracts trace output. [`VcdRecorder`]
//! implements the IEEE 1364 Value Change Dump (VCD) format with one
//! timestamp per clock cycle, viewable in GTKWave or Surfer. Recording is
//! observational only: it never influences scheduling or protocol timing.

use std::io::Write;

use strobe_common::BitVec;

use crate::error::SimError;
use crate::signal::SignalId;

/// Trait for recording signal traces during a harness run.
pub trait WaveformRecorder {
    /// Registers a signal for recording.
    fn register_signal(&mut self, id: SignalId, name: &str, width: u32) -> Result<(), SimError>;

    /// Opens a new scope (hierarchy level) in the trace.
    fn begin_scope(&mut self, name: &str) -> Result<(), SimError>;

    /// Closes the current scope.
    fn end_scope(&mut self) -> Result<(), SimError>;

    /// Records a value change at the given clock cycle.
    fn record_change(&mut self, cycle: u64, id: SignalId, value: &BitVec) -> Result<(), SimError>;

    /// Finalizes the trace output (flush, trailer).
    fn finalize(&mut self) -> Result<(), SimError>;
}

/// VCD (Value Change Dump) recorder following IEEE 1364.
///
/// Timestamps are clock-cycle numbers with a nominal 1 ns timescale.
/// Signal identifiers use printable ASCII characters starting from `!`.
pub struct VcdRecorder<W: Write> {
    writer: W,
    id_map: Vec<(SignalId, String, u32)>,
    next_id: u32,
    header_written: bool,
    current_time: Option<u64>,
}

impl<W: Write> VcdRecorder<W> {
    /// Creates a new VCD recorder writing to the given output.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            id_map: Vec::new(),
            next_id: 0,
            header_written: false,
            current_time: None,
        }
    }

    fn write_header(&mut self) -> Result<(), SimError> {
        writeln!(self.writer, "$version")?;
        writeln!(self.writer, "  Strobe harness")?;
        writeln!(self.writer, "$end")?;
        writeln!(self.writer, "$timescale")?;
        writeln!(self.writer, "  1ns")?;
        writeln!(self.writer, "$end")?;
        Ok(())
    }

    /// Generates a VCD identifier code from a sequential index.
    ///
    /// Uses printable ASCII characters starting from `!` (0x21);
    /// multi-character codes are generated for indices >= 94.
    fn make_id_code(index: u32) -> String {
        let mut result = String::new();
        let mut idx = index;
        loop {
            let c = (b'!' + (idx % 94) as u8) as char;
            result.push(c);
            idx /= 94;
            if idx == 0 {
                break;
            }
            idx -= 1;
        }
        result
    }

    fn format_value(value: &BitVec, width: u32) -> String {
        if width == 1 {
            if value.get(0) { "1".into() } else { "0".into() }
        } else {
            let mut s = String::with_capacity(width as usize + 1);
            s.push('b');
            for i in (0..width).rev() {
                s.push(if value.get(i) { '1' } else { '0' });
            }
            s
        }
    }
}

impl<W: Write> WaveformRecorder for VcdRecorder<W> {
    fn register_signal(&mut self, id: SignalId, name: &str, width: u32) -> Result<(), SimError> {
        let id_code = Self::make_id_code(self.next_id);
        self.next_id += 1;

        writeln!(self.writer, "$var wire {width} {id_code} {name} $end")?;

        self.id_map.push((id, id_code, width));
        Ok(())
    }

    fn begin_scope(&mut self, name: &str) -> Result<(), SimError> {
        if !self.header_written {
            self.write_header()?;
            self.header_written = true;
        }
        writeln!(self.writer, "$scope module {name} $end")?;
        Ok(())
    }

    fn end_scope(&mut self) -> Result<(), SimError> {
        writeln!(self.writer, "$upscope $end")?;
        writeln!(self.writer, "$enddefinitions $end")?;
        Ok(())
    }

    fn record_change(&mut self, cycle: u64, id: SignalId, value: &BitVec) -> Result<(), SimError> {
        if self.current_time != Some(cycle) {
            writeln!(self.writer, "#{cycle}")?;
            self.current_time = Some(cycle);
        }
        if let Some((_, code, width)) = self.id_map.iter().find(|(sid, _, _)| *sid == id) {
            let formatted = Self::format_value(value, *width);
            if *width == 1 {
                writeln!(self.writer, "{formatted}{code}")?;
            } else {
                writeln!(self.writer, "{formatted} {code}")?;
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SimError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_codes_are_printable_and_unique() {
        let a = VcdRecorder::<Vec<u8>>::make_id_code(0);
        let b = VcdRecorder::<Vec<u8>>::make_id_code(1);
        let wide = VcdRecorder::<Vec<u8>>::make_id_code(94);
        assert_eq!(a, "!");
        assert_eq!(b, "\"");
        assert_eq!(wide.len(), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn single_bit_format() {
        assert_eq!(
            VcdRecorder::<Vec<u8>>::format_value(&BitVec::from_bool(true), 1),
            "1"
        );
        assert_eq!(
            VcdRecorder::<Vec<u8>>::format_value(&BitVec::from_bool(false), 1),
            "0"
        );
    }

    #[test]
    fn multi_bit_format() {
        let v = BitVec::from_u64(0b0110, 4);
        assert_eq!(VcdRecorder::<Vec<u8>>::format_value(&v, 4), "b0110");
    }

    #[test]
    fn produces_valid_vcd_structure() {
        let mut rec = VcdRecorder::new(Vec::new());
        rec.begin_scope("dut").unwrap();
        rec.register_signal(SignalId::from_raw(0), "clk_like", 1).unwrap();
        rec.register_signal(SignalId::from_raw(1), "data", 4).unwrap();
        rec.end_scope().unwrap();
        rec.record_change(0, SignalId::from_raw(0), &BitVec::from_bool(false))
            .unwrap();
        rec.record_change(3, SignalId::from_raw(1), &BitVec::from_u64(0xA, 4))
            .unwrap();
        rec.finalize().unwrap();

        let out = String::from_utf8(rec.writer).unwrap();
        assert!(out.contains("$timescale"));
        assert!(out.contains("$scope module dut $end"));
        assert!(out.contains("$var wire 1 ! clk_like $end"));
        assert!(out.contains("$var wire 4 \" data $end"));
        assert!(out.contains("$enddefinitions $end"));
        assert!(out.contains("#0\n0!"));
        assert!(out.contains("#3\nb1010 \""));
    }

    #[test]
    fn repeated_timestamps_written_once() {
        let mut rec = VcdRecorder::new(Vec::new());
        rec.begin_scope("dut").unwrap();
        rec.register_signal(SignalId::from_raw(0), "x", 1).unwrap();
        rec.register_signal(SignalId::from_raw(1), "y", 1).unwrap();
        rec.end_scope().unwrap();
        rec.record_change(5, SignalId::from_raw(0), &BitVec::from_bool(true))
            .unwrap();
        rec.record_change(5, SignalId::from_raw(1), &BitVec::from_bool(true))
            .unwrap();

        let out = String::from_utf8(rec.writer).unwrap();
        assert_eq!(out.matches("#5").count(), 1);
    }

    #[test]
    fn unregistered_signal_is_ignored() {
        let mut rec = VcdRecorder::new(Vec::new());
        rec.begin_scope("dut").unwrap();
        rec.end_scope().unwrap();
        rec.record_change(0, SignalId::from_raw(9), &BitVec::from_bool(true))
            .unwrap();
        let out = String::from_utf8(rec.writer).unwrap();
        assert!(!out.contains("1!"));
    }

    #[test]
    fn writes_to_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.vcd");
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut rec = VcdRecorder::new(std::io::BufWriter::new(file));
            rec.begin_scope("dut").unwrap();
            rec.register_signal(SignalId::from_raw(0), "x", 1).unwrap();
            rec.end_scope().unwrap();
            rec.record_change(0, SignalId::from_raw(0), &BitVec::from_bool(true))
                .unwrap();
            rec.finalize().unwrap();
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("$var wire 1 ! x $end"));
    }
}
