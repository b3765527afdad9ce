//! Gate library: named 1- and 2-qubit gates lowered onto the kernel
//!
//! Single-bit gates build their mask set and hand a constant or generated
//! 2×2 matrix to the kernel. Controlled variants extend the mask set with
//! the control bits; anti-controlled variants act in the control-zero
//! subspace instead. Register-range forms iterate the gate bit-wise.

use crate::register::Register;
use quvec_gates::{self as gates, Matrix2x2};
use quvec_state::{par_for, AmpView, Result, StateError, StateVector};
use smallvec::SmallVec;

impl Register {
    // ---- Pauli and Hadamard ----------------------------------------------

    /// NOT gate, the Pauli x matrix
    pub fn x(&mut self, qubit: usize) -> Result<()> {
        self.apply_single_bit(qubit, &gates::PAULI_X, false)
    }

    /// Apply the Pauli y matrix
    pub fn y(&mut self, qubit: usize) -> Result<()> {
        self.apply_single_bit(qubit, &gates::PAULI_Y, false)
    }

    /// Apply the Pauli z matrix
    pub fn z(&mut self, qubit: usize) -> Result<()> {
        self.apply_single_bit(qubit, &gates::PAULI_Z, false)
    }

    /// Hadamard gate
    pub fn h(&mut self, qubit: usize) -> Result<()> {
        self.apply_single_bit(qubit, &gates::HADAMARD, true)
    }

    // ---- rotations -------------------------------------------------------

    /// Phase shift gate, rotating as e^(-iθ/2) around |1⟩
    pub fn rt(&mut self, radians: f64, qubit: usize) -> Result<()> {
        self.apply_single_bit(qubit, &gates::phase_shift(radians), true)
    }

    /// Dyadic-fraction phase shift around |1⟩
    pub fn rt_dyad(&mut self, numerator: i32, denominator: i32, qubit: usize) -> Result<()> {
        self.rt(gates::dyadic_angle(numerator, denominator), qubit)
    }

    /// Rotation around the Pauli x axis
    pub fn rx(&mut self, radians: f64, qubit: usize) -> Result<()> {
        self.apply_single_bit(qubit, &gates::rotation_x(radians), true)
    }

    /// Dyadic-fraction x axis rotation
    pub fn rx_dyad(&mut self, numerator: i32, denominator: i32, qubit: usize) -> Result<()> {
        self.rx(gates::dyadic_angle(numerator, denominator), qubit)
    }

    /// Rotation around the Pauli y axis
    pub fn ry(&mut self, radians: f64, qubit: usize) -> Result<()> {
        self.apply_single_bit(qubit, &gates::rotation_y(radians), true)
    }

    /// Dyadic-fraction y axis rotation
    pub fn ry_dyad(&mut self, numerator: i32, denominator: i32, qubit: usize) -> Result<()> {
        self.ry(gates::dyadic_angle(numerator, denominator), qubit)
    }

    /// Rotation around the Pauli z axis
    pub fn rz(&mut self, radians: f64, qubit: usize) -> Result<()> {
        self.apply_single_bit(qubit, &gates::rotation_z(radians), true)
    }

    /// Dyadic-fraction z axis rotation
    pub fn rz_dyad(&mut self, numerator: i32, denominator: i32, qubit: usize) -> Result<()> {
        self.rz(gates::dyadic_angle(numerator, denominator), qubit)
    }

    // ---- controlled gates ------------------------------------------------

    /// Controlled not
    pub fn cnot(&mut self, control: usize, target: usize) -> Result<()> {
        self.apply_controlled_2x2(control, target, &gates::PAULI_X, false)
    }

    /// Apply "not" only where the control bit is zero
    pub fn anti_cnot(&mut self, control: usize, target: usize) -> Result<()> {
        self.apply_anti_controlled_2x2(control, target, &gates::PAULI_X, false)
    }

    /// Doubly-controlled not (Toffoli)
    pub fn ccnot(&mut self, control1: usize, control2: usize, target: usize) -> Result<()> {
        self.check_qubit(control1)?;
        self.check_qubit(control2)?;
        self.check_qubit(target)?;
        self.check_distinct(control1, control2)?;
        self.check_distinct(control1, target)?;
        self.check_distinct(control2, target)?;

        let c1 = 1usize << control1;
        let c2 = 1usize << control2;
        let t = 1usize << target;
        let mut sorted: SmallVec<[usize; 3]> = SmallVec::from_slice(&[c1, c2, t]);
        sorted.sort_unstable();
        self.kernel_apply_2x2(c1 | c2, c1 | c2 | t, &gates::PAULI_X, &sorted, false, false)
    }

    /// Apply "not" only where both control bits are zero
    pub fn anti_ccnot(&mut self, control1: usize, control2: usize, target: usize) -> Result<()> {
        self.check_qubit(control1)?;
        self.check_qubit(control2)?;
        self.check_qubit(target)?;
        self.check_distinct(control1, control2)?;
        self.check_distinct(control1, target)?;
        self.check_distinct(control2, target)?;

        let c1 = 1usize << control1;
        let c2 = 1usize << control2;
        let t = 1usize << target;
        let mut sorted: SmallVec<[usize; 3]> = SmallVec::from_slice(&[c1, c2, t]);
        sorted.sort_unstable();
        self.kernel_apply_2x2(0, t, &gates::PAULI_X, &sorted, false, false)
    }

    /// Controlled Pauli y
    pub fn cy(&mut self, control: usize, target: usize) -> Result<()> {
        self.apply_controlled_2x2(control, target, &gates::PAULI_Y, false)
    }

    /// Controlled Pauli z
    pub fn cz(&mut self, control: usize, target: usize) -> Result<()> {
        self.apply_controlled_2x2(control, target, &gates::PAULI_Z, false)
    }

    /// Controlled phase shift around |1⟩
    pub fn crt(&mut self, radians: f64, control: usize, target: usize) -> Result<()> {
        self.apply_controlled_2x2(control, target, &gates::phase_shift(radians), true)
    }

    /// Controlled dyadic-fraction phase shift
    pub fn crt_dyad(
        &mut self,
        numerator: i32,
        denominator: i32,
        control: usize,
        target: usize,
    ) -> Result<()> {
        self.crt(gates::dyadic_angle(numerator, denominator), control, target)
    }

    /// Controlled x axis rotation
    pub fn crx(&mut self, radians: f64, control: usize, target: usize) -> Result<()> {
        self.apply_controlled_2x2(control, target, &gates::rotation_x(radians), true)
    }

    /// Controlled dyadic-fraction x axis rotation
    pub fn crx_dyad(
        &mut self,
        numerator: i32,
        denominator: i32,
        control: usize,
        target: usize,
    ) -> Result<()> {
        self.crx(gates::dyadic_angle(numerator, denominator), control, target)
    }

    /// Controlled y axis rotation
    pub fn cry(&mut self, radians: f64, control: usize, target: usize) -> Result<()> {
        self.apply_controlled_2x2(control, target, &gates::rotation_y(radians), true)
    }

    /// Controlled dyadic-fraction y axis rotation
    pub fn cry_dyad(
        &mut self,
        numerator: i32,
        denominator: i32,
        control: usize,
        target: usize,
    ) -> Result<()> {
        self.cry(gates::dyadic_angle(numerator, denominator), control, target)
    }

    /// Controlled z axis rotation
    pub fn crz(&mut self, radians: f64, control: usize, target: usize) -> Result<()> {
        self.apply_controlled_2x2(control, target, &gates::rotation_z(radians), true)
    }

    /// Controlled dyadic-fraction z axis rotation
    pub fn crz_dyad(
        &mut self,
        numerator: i32,
        denominator: i32,
        control: usize,
        target: usize,
    ) -> Result<()> {
        self.crz(gates::dyadic_angle(numerator, denominator), control, target)
    }

    // ---- swap ------------------------------------------------------------

    /// Exchange the values of two qubits
    pub fn swap(&mut self, qubit1: usize, qubit2: usize) -> Result<()> {
        self.check_qubit(qubit1)?;
        self.check_qubit(qubit2)?;
        self.check_distinct(qubit1, qubit2)?;

        let p1 = 1usize << qubit1;
        let p2 = 1usize << qubit2;
        let sorted = [p1.min(p2), p1.max(p2)];
        self.kernel_apply_2x2(p1, p2, &gates::PAULI_X, &sorted, false, false)
    }

    /// Reverse qubit order over `[first, last)` by pairwise swaps.
    pub fn reverse(&mut self, mut first: usize, mut last: usize) -> Result<()> {
        while first < last && first < last - 1 {
            last -= 1;
            self.swap(first, last)?;
            first += 1;
        }
        Ok(())
    }

    // ---- logic gates -----------------------------------------------------

    /// "AND" two qubits into an output qubit.
    ///
    /// The output may alias both inputs (a no-op) but not exactly one.
    pub fn and(&mut self, input1: usize, input2: usize, output: usize) -> Result<()> {
        if input1 == input2 && input2 == output {
            return Ok(());
        }
        if input1 == output || input2 == output {
            return Err(StateError::OverlappingQubits { index: output });
        }
        self.set_bit(output, false)?;
        if input1 == input2 {
            self.cnot(input1, output)
        } else {
            self.ccnot(input1, input2, output)
        }
    }

    /// "AND" a qubit with a classical bit into an output qubit
    pub fn cland(&mut self, input: usize, classical: bool, output: usize) -> Result<()> {
        if !classical {
            self.set_bit(output, false)
        } else if input != output {
            self.set_bit(output, false)?;
            self.cnot(input, output)
        } else {
            Ok(())
        }
    }

    /// "OR" two qubits into an output qubit
    pub fn or(&mut self, input1: usize, input2: usize, output: usize) -> Result<()> {
        if input1 == input2 && input2 == output {
            return Ok(());
        }
        if input1 == output || input2 == output {
            return Err(StateError::OverlappingQubits { index: output });
        }
        self.set_bit(output, true)?;
        if input1 == input2 {
            self.anti_cnot(input1, output)
        } else {
            self.anti_ccnot(input1, input2, output)
        }
    }

    /// "OR" a qubit with a classical bit into an output qubit
    pub fn clor(&mut self, input: usize, classical: bool, output: usize) -> Result<()> {
        if classical {
            self.set_bit(output, true)
        } else if input != output {
            self.set_bit(output, false)?;
            self.cnot(input, output)
        } else {
            Ok(())
        }
    }

    /// "XOR" two qubits into an output qubit
    pub fn xor(&mut self, input1: usize, input2: usize, output: usize) -> Result<()> {
        if input1 == input2 && input2 == output {
            return self.set_bit(output, false);
        }
        if input1 == output {
            self.cnot(input2, output)
        } else if input2 == output {
            self.cnot(input1, output)
        } else {
            self.set_bit(output, false)?;
            self.cnot(input1, output)?;
            self.cnot(input2, output)
        }
    }

    /// "XOR" a qubit with a classical bit into an output qubit
    pub fn clxor(&mut self, input: usize, classical: bool, output: usize) -> Result<()> {
        if input != output {
            self.set_bit(output, classical)?;
            self.cnot(input, output)
        } else if classical {
            self.x(output)
        } else {
            Ok(())
        }
    }

    // ---- register-range forms --------------------------------------------

    /// Apply X to each bit of a contiguous range, as one permutation sweep.
    pub fn x_reg(&mut self, start: usize, length: usize) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        if length == 1 {
            return self.x(start);
        }
        self.check_range(start, length)?;

        let dimension = self.max_q_power;
        let in_out_mask = ((1usize << length) - 1) << start;
        let other_mask = (dimension - 1) ^ in_out_mask;

        let mut next = StateVector::zeroed(self.qubit_count)?;
        {
            let src = self.state.amplitudes();
            let view = AmpView::new(next.amplitudes_mut());
            par_for(self.sweep, 0, dimension, |lcv| {
                let other_res = lcv & other_mask;
                let in_out_res = !lcv & in_out_mask;
                unsafe { view.write(in_out_res | other_res, src[lcv]) };
            });
        }
        self.state.replace(next);
        Ok(())
    }

    /// Apply Y to each bit of a contiguous range
    pub fn y_reg(&mut self, start: usize, length: usize) -> Result<()> {
        self.check_range(start, length)?;
        for i in 0..length {
            self.y(start + i)?;
        }
        Ok(())
    }

    /// Apply Z to each bit of a contiguous range
    pub fn z_reg(&mut self, start: usize, length: usize) -> Result<()> {
        self.check_range(start, length)?;
        for i in 0..length {
            self.z(start + i)?;
        }
        Ok(())
    }

    /// Apply Hadamard to each bit of a contiguous range
    pub fn h_reg(&mut self, start: usize, length: usize) -> Result<()> {
        self.check_range(start, length)?;
        for i in 0..length {
            self.h(start + i)?;
        }
        Ok(())
    }

    /// Phase shift each bit of a contiguous range
    pub fn rt_reg(&mut self, radians: f64, start: usize, length: usize) -> Result<()> {
        self.check_range(start, length)?;
        for i in 0..length {
            self.rt(radians, start + i)?;
        }
        Ok(())
    }

    /// Dyadic phase shift each bit of a contiguous range
    pub fn rt_dyad_reg(
        &mut self,
        numerator: i32,
        denominator: i32,
        start: usize,
        length: usize,
    ) -> Result<()> {
        self.check_range(start, length)?;
        for i in 0..length {
            self.rt_dyad(numerator, denominator, start + i)?;
        }
        Ok(())
    }

    /// Rotate each bit of a contiguous range around the x axis
    pub fn rx_reg(&mut self, radians: f64, start: usize, length: usize) -> Result<()> {
        self.check_range(start, length)?;
        for i in 0..length {
            self.rx(radians, start + i)?;
        }
        Ok(())
    }

    /// Dyadic x rotation across a contiguous range
    pub fn rx_dyad_reg(
        &mut self,
        numerator: i32,
        denominator: i32,
        start: usize,
        length: usize,
    ) -> Result<()> {
        self.check_range(start, length)?;
        for i in 0..length {
            self.rx_dyad(numerator, denominator, start + i)?;
        }
        Ok(())
    }

    /// Rotate each bit of a contiguous range around the y axis
    pub fn ry_reg(&mut self, radians: f64, start: usize, length: usize) -> Result<()> {
        self.check_range(start, length)?;
        for i in 0..length {
            self.ry(radians, start + i)?;
        }
        Ok(())
    }

    /// Dyadic y rotation across a contiguous range
    pub fn ry_dyad_reg(
        &mut self,
        numerator: i32,
        denominator: i32,
        start: usize,
        length: usize,
    ) -> Result<()> {
        self.check_range(start, length)?;
        for i in 0..length {
            self.ry_dyad(numerator, denominator, start + i)?;
        }
        Ok(())
    }

    /// Rotate each bit of a contiguous range around the z axis
    pub fn rz_reg(&mut self, radians: f64, start: usize, length: usize) -> Result<()> {
        self.check_range(start, length)?;
        for i in 0..length {
            self.rz(radians, start + i)?;
        }
        Ok(())
    }

    /// Dyadic z rotation across a contiguous range
    pub fn rz_dyad_reg(
        &mut self,
        numerator: i32,
        denominator: i32,
        start: usize,
        length: usize,
    ) -> Result<()> {
        self.check_range(start, length)?;
        for i in 0..length {
            self.rz_dyad(numerator, denominator, start + i)?;
        }
        Ok(())
    }

    /// Controlled phase shift across paired ranges
    pub fn crt_reg(
        &mut self,
        radians: f64,
        control: usize,
        target: usize,
        length: usize,
    ) -> Result<()> {
        for i in 0..length {
            self.crt(radians, control + i, target + i)?;
        }
        Ok(())
    }

    /// Controlled dyadic phase shift across paired ranges
    pub fn crt_dyad_reg(
        &mut self,
        numerator: i32,
        denominator: i32,
        control: usize,
        target: usize,
        length: usize,
    ) -> Result<()> {
        for i in 0..length {
            self.crt_dyad(numerator, denominator, control + i, target + i)?;
        }
        Ok(())
    }

    /// Controlled x rotation across paired ranges
    pub fn crx_reg(
        &mut self,
        radians: f64,
        control: usize,
        target: usize,
        length: usize,
    ) -> Result<()> {
        for i in 0..length {
            self.crx(radians, control + i, target + i)?;
        }
        Ok(())
    }

    /// Controlled dyadic x rotation across paired ranges
    pub fn crx_dyad_reg(
        &mut self,
        numerator: i32,
        denominator: i32,
        control: usize,
        target: usize,
        length: usize,
    ) -> Result<()> {
        for i in 0..length {
            self.crx_dyad(numerator, denominator, control + i, target + i)?;
        }
        Ok(())
    }

    /// Controlled y rotation across paired ranges
    pub fn cry_reg(
        &mut self,
        radians: f64,
        control: usize,
        target: usize,
        length: usize,
    ) -> Result<()> {
        for i in 0..length {
            self.cry(radians, control + i, target + i)?;
        }
        Ok(())
    }

    /// Controlled dyadic y rotation across paired ranges
    pub fn cry_dyad_reg(
        &mut self,
        numerator: i32,
        denominator: i32,
        control: usize,
        target: usize,
        length: usize,
    ) -> Result<()> {
        for i in 0..length {
            self.cry_dyad(numerator, denominator, control + i, target + i)?;
        }
        Ok(())
    }

    /// Controlled z rotation across paired ranges
    pub fn crz_reg(
        &mut self,
        radians: f64,
        control: usize,
        target: usize,
        length: usize,
    ) -> Result<()> {
        for i in 0..length {
            self.crz(radians, control + i, target + i)?;
        }
        Ok(())
    }

    /// Controlled dyadic z rotation across paired ranges
    pub fn crz_dyad_reg(
        &mut self,
        numerator: i32,
        denominator: i32,
        control: usize,
        target: usize,
        length: usize,
    ) -> Result<()> {
        for i in 0..length {
            self.crz_dyad(numerator, denominator, control + i, target + i)?;
        }
        Ok(())
    }

    /// Controlled Pauli y across paired ranges
    pub fn cy_reg(&mut self, control: usize, target: usize, length: usize) -> Result<()> {
        for i in 0..length {
            self.cy(control + i, target + i)?;
        }
        Ok(())
    }

    /// Controlled Pauli z across paired ranges
    pub fn cz_reg(&mut self, control: usize, target: usize, length: usize) -> Result<()> {
        for i in 0..length {
            self.cz(control + i, target + i)?;
        }
        Ok(())
    }

    /// Bit-parallel CNOT of one range onto another
    pub fn cnot_reg(&mut self, control_start: usize, target_start: usize, length: usize) -> Result<()> {
        if control_start == target_start {
            return Ok(());
        }
        for i in 0..length {
            self.cnot(control_start + i, target_start + i)?;
        }
        Ok(())
    }

    /// Exchange two bit ranges.
    ///
    /// Non-overlapping ranges exchange in one permutation sweep; overlapping
    /// ranges fall back to bit-wise swaps.
    pub fn swap_reg(&mut self, start1: usize, start2: usize, length: usize) -> Result<()> {
        if length == 0 || start1 == start2 {
            return Ok(());
        }
        if length == 1 {
            return self.swap(start1, start2);
        }
        self.check_range(start1, length)?;
        self.check_range(start2, length)?;

        let distance = start1.abs_diff(start2);
        if distance < length {
            for i in 0..length {
                self.swap(start1 + i, start2 + i)?;
            }
            return Ok(());
        }

        let dimension = self.max_q_power;
        let reg1_mask = ((1usize << length) - 1) << start1;
        let reg2_mask = ((1usize << length) - 1) << start2;
        let other_mask = (dimension - 1) ^ (reg1_mask | reg2_mask);

        let mut next = StateVector::zeroed(self.qubit_count)?;
        {
            let src = self.state.amplitudes();
            let view = AmpView::new(next.amplitudes_mut());
            par_for(self.sweep, 0, dimension, |lcv| {
                let other_res = lcv & other_mask;
                let reg1_res = ((lcv & reg1_mask) >> start1) << start2;
                let reg2_res = ((lcv & reg2_mask) >> start2) << start1;
                unsafe { view.write(reg1_res | reg2_res | other_res, src[lcv]) };
            });
        }
        self.state.replace(next);
        Ok(())
    }

    /// "AND" two bit ranges into an output range
    pub fn and_reg(
        &mut self,
        input_start1: usize,
        input_start2: usize,
        output_start: usize,
        length: usize,
    ) -> Result<()> {
        if input_start1 == input_start2 && input_start2 == output_start {
            return Ok(());
        }
        for i in 0..length {
            self.and(input_start1 + i, input_start2 + i, output_start + i)?;
        }
        Ok(())
    }

    /// "AND" a bit range with a classical integer into an output range
    pub fn cland_reg(
        &mut self,
        input_start: usize,
        classical: usize,
        output_start: usize,
        length: usize,
    ) -> Result<()> {
        for i in 0..length {
            let bit = classical & (1usize << i) != 0;
            self.cland(input_start + i, bit, output_start + i)?;
        }
        Ok(())
    }

    /// "OR" two bit ranges into an output range
    pub fn or_reg(
        &mut self,
        input_start1: usize,
        input_start2: usize,
        output_start: usize,
        length: usize,
    ) -> Result<()> {
        if input_start1 == input_start2 && input_start2 == output_start {
            return Ok(());
        }
        for i in 0..length {
            self.or(input_start1 + i, input_start2 + i, output_start + i)?;
        }
        Ok(())
    }

    /// "OR" a bit range with a classical integer into an output range
    pub fn clor_reg(
        &mut self,
        input_start: usize,
        classical: usize,
        output_start: usize,
        length: usize,
    ) -> Result<()> {
        for i in 0..length {
            let bit = classical & (1usize << i) != 0;
            self.clor(input_start + i, bit, output_start + i)?;
        }
        Ok(())
    }

    /// "XOR" two bit ranges into an output range
    pub fn xor_reg(
        &mut self,
        input_start1: usize,
        input_start2: usize,
        output_start: usize,
        length: usize,
    ) -> Result<()> {
        if input_start1 == input_start2 && input_start2 == output_start {
            return Ok(());
        }
        for i in 0..length {
            self.xor(input_start1 + i, input_start2 + i, output_start + i)?;
        }
        Ok(())
    }

    /// "XOR" a bit range with a classical integer into an output range
    pub fn clxor_reg(
        &mut self,
        input_start: usize,
        classical: usize,
        output_start: usize,
        length: usize,
    ) -> Result<()> {
        for i in 0..length {
            let bit = classical & (1usize << i) != 0;
            self.clxor(input_start + i, bit, output_start + i)?;
        }
        Ok(())
    }

    /// Apply an arbitrary caller-supplied single-bit unitary.
    pub fn apply_unitary(&mut self, qubit: usize, mtrx: &Matrix2x2) -> Result<()> {
        self.apply_single_bit(qubit, mtrx, true)
    }
}
