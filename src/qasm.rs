//! The OpenQASM IR: instruction arguments, comparisons, instructions, and
//! the per-region `Program` / per-function `Gate` containers, each knowing
//! how to emit itself as QASM 2.0 text.

use crate::payload::CompareOp;

/// The helper qubit register synthesized to initialize non-zero classical
/// registers.
pub const MEASUREMENT_QUBIT_NAME: &str = "cregmbit";

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    UInt(i64),
    CReg(String),
    QuantumReg(String),
    QuantumIndex { name: String, index: i64 },
    QuantumSlice { name: String, start: i64, end: i64 },
}

impl Argument {
    pub fn emit(&self) -> String {
        self.emit_broadcast(0)
    }

    /// Emission at a broadcast offset: slice arguments walk `start..=end`
    /// as the offset advances, everything else is unaffected.
    fn emit_broadcast(&self, offset: i64) -> String {
        match self {
            Argument::UInt(value) => value.to_string(),
            Argument::CReg(name) => name.clone(),
            Argument::QuantumReg(name) => name.clone(),
            Argument::QuantumIndex { name, index } => format!("{}[{}]", name, index),
            Argument::QuantumSlice { name, start, .. } => {
                format!("{}[{}]", name, start + offset)
            }
        }
    }

    fn slice_len(&self) -> Option<i64> {
        if let Argument::QuantumSlice { start, end, .. } = self {
            Some(end - start + 1)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub lhs: Argument,
    pub op: CompareOp,
    pub rhs: Argument,
}

impl Comparison {
    /// `Some(outcome)` when both operands are literals and the branch can
    /// be decided now.
    pub fn compile_time_result(&self) -> Option<bool> {
        if let (Argument::UInt(lhs), Argument::UInt(rhs)) = (&self.lhs, &self.rhs) {
            Some(match self.op {
                CompareOp::Eq => lhs == rhs,
                CompareOp::Neq => lhs != rhs,
                CompareOp::Greater => lhs > rhs,
                CompareOp::Lesser => lhs < rhs,
            })
        } else {
            None
        }
    }

    pub fn emit(&self) -> String {
        format!("{}{}{}", self.lhs.emit(), self.op.symbol(), self.rhs.emit())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    FunctionCall {
        name: String,
        cargs: Vec<Argument>,
        qargs: Vec<Argument>,
    },
    If {
        comparison: Comparison,
        body: Vec<Instruction>,
    },
    QuantumInitialization {
        name: String,
        size: usize,
        bits: Vec<bool>,
    },
    ClassicalInitialization {
        name: String,
        size: usize,
        bits: Vec<bool>,
    },
    Measurement {
        r_name: String,
        r_start: i64,
        q_name: String,
        q_start: i64,
        q_end: i64,
    },
}

impl Instruction {
    pub fn emit(&self) -> String {
        match self {
            Instruction::FunctionCall { name, cargs, qargs } => {
                let header = if cargs.is_empty() {
                    format!("{} ", name)
                } else {
                    let cargs: Vec<String> = cargs.iter().map(Argument::emit).collect();
                    format!("{}({}) ", name, cargs.join(","))
                };
                // A slice argument broadcasts the call over each index in
                // the slice; the first slice drives the count.
                let repeats = qargs.iter().find_map(Argument::slice_len).unwrap_or(1);
                let mut output = String::new();
                for offset in 0..repeats {
                    let qargs: Vec<String> =
                        qargs.iter().map(|q| q.emit_broadcast(offset)).collect();
                    output.push_str(&header);
                    output.push_str(&qargs.join(", "));
                    output.push_str(";\n");
                }
                output
            }
            Instruction::If { comparison, body } => {
                let body_text: String = body.iter().map(Instruction::emit).collect();
                match comparison.compile_time_result() {
                    Some(true) => body_text,
                    Some(false) => String::new(),
                    None => {
                        let mut output = String::new();
                        for line in body_text.lines() {
                            output.push_str(&format!("if ({}) {}\n", comparison.emit(), line));
                        }
                        output
                    }
                }
            }
            Instruction::QuantumInitialization { name, size, .. } => {
                format!("qreg {}[{}];\n", name, size)
            }
            Instruction::ClassicalInitialization { name, size, bits } => {
                let mut output = format!("creg {}[{}];\n", name, size);
                for (i, &bit) in bits.iter().enumerate() {
                    if bit {
                        output.push_str(&format!(
                            "x {m}[0];\nmeasure {m}[0] -> {name}[{i}];\nreset {m};\n",
                            m = MEASUREMENT_QUBIT_NAME,
                            name = name,
                            i = i
                        ));
                    }
                }
                output
            }
            Instruction::Measurement {
                r_name,
                r_start,
                q_name,
                q_start,
                q_end,
            } => {
                let mut output = String::new();
                for i in 0..=(q_end - q_start) {
                    output.push_str(&format!(
                        "measure {}[{}] -> {}[{}];\n",
                        q_name,
                        q_start + i,
                        r_name,
                        r_start + i
                    ));
                }
                output
            }
        }
    }
}

/// One compiled region: a standalone circuit.
#[derive(Debug, Clone)]
pub struct Program {
    pub qubits: i64,
    pub instructions: Vec<Instruction>,
    /// User-defined gates the instructions reference, in order of first
    /// appearance.
    pub dependencies: Vec<String>,
    pub needs_measurement_qubit: bool,
}

impl Program {
    pub fn emit(&self) -> String {
        let mut output = String::new();
        if self.needs_measurement_qubit {
            output.push_str(&format!("qreg {}[1];\n", MEASUREMENT_QUBIT_NAME));
        }
        for instruction in &self.instructions {
            output.push_str(&instruction.emit());
        }
        output
    }
}

/// One compiled function: a reusable gate definition.
#[derive(Debug, Clone)]
pub struct Gate {
    pub name: String,
    pub cargs: Vec<String>,
    pub qargs: Vec<String>,
    pub instructions: Vec<Instruction>,
}

impl Gate {
    pub fn emit(&self) -> String {
        let mut output = String::from("gate ");
        output.push_str(&self.name);
        if !self.cargs.is_empty() {
            output.push_str(&format!("({})", self.cargs.join(",")));
        }
        output.push(' ');
        output.push_str(&self.qargs.join(", "));
        output.push_str(" {\n");
        for instruction in &self.instructions {
            output.push_str(&instruction.emit());
        }
        output.push_str("}\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_without_cargs() {
        let call = Instruction::FunctionCall {
            name: "h".into(),
            cargs: vec![],
            qargs: vec![Argument::QuantumIndex {
                name: "q".into(),
                index: 0,
            }],
        };
        assert_eq!(call.emit(), "h q[0];\n");
    }

    #[test]
    fn call_with_cargs() {
        let call = Instruction::FunctionCall {
            name: "rx".into(),
            cargs: vec![Argument::UInt(14)],
            qargs: vec![Argument::QuantumIndex {
                name: "q".into(),
                index: 0,
            }],
        };
        assert_eq!(call.emit(), "rx(14) q[0];\n");
    }

    #[test]
    fn slice_arguments_broadcast() {
        let call = Instruction::FunctionCall {
            name: "h".into(),
            cargs: vec![],
            qargs: vec![Argument::QuantumSlice {
                name: "q".into(),
                start: 1,
                end: 3,
            }],
        };
        assert_eq!(call.emit(), "h q[1];\nh q[2];\nh q[3];\n");
    }

    #[test]
    fn broadcast_keeps_fixed_arguments_fixed() {
        let call = Instruction::FunctionCall {
            name: "cx".into(),
            cargs: vec![],
            qargs: vec![
                Argument::QuantumIndex {
                    name: "c".into(),
                    index: 0,
                },
                Argument::QuantumSlice {
                    name: "q".into(),
                    start: 0,
                    end: 1,
                },
            ],
        };
        assert_eq!(call.emit(), "cx c[0], q[0];\ncx c[0], q[1];\n");
    }

    #[test]
    fn classical_initialization_flips_set_bits() {
        let init = Instruction::ClassicalInitialization {
            name: "c".into(),
            size: 2,
            bits: vec![true, false],
        };
        assert_eq!(
            init.emit(),
            "creg c[2];\nx cregmbit[0];\nmeasure cregmbit[0] -> c[0];\nreset cregmbit;\n"
        );
    }

    #[test]
    fn measurement_expands_over_the_slice() {
        let m = Instruction::Measurement {
            r_name: "c".into(),
            r_start: 1,
            q_name: "q".into(),
            q_start: 0,
            q_end: 2,
        };
        assert_eq!(
            m.emit(),
            "measure q[0] -> c[1];\nmeasure q[1] -> c[2];\nmeasure q[2] -> c[3];\n"
        );
    }

    #[test]
    fn constant_true_if_inlines_the_body() {
        let body = vec![Instruction::FunctionCall {
            name: "h".into(),
            cargs: vec![],
            qargs: vec![Argument::QuantumIndex {
                name: "q".into(),
                index: 0,
            }],
        }];
        let instr = Instruction::If {
            comparison: Comparison {
                lhs: Argument::UInt(2),
                op: CompareOp::Greater,
                rhs: Argument::UInt(1),
            },
            body,
        };
        assert_eq!(instr.emit(), "h q[0];\n");
    }

    #[test]
    fn constant_false_if_emits_nothing() {
        let instr = Instruction::If {
            comparison: Comparison {
                lhs: Argument::UInt(1),
                op: CompareOp::Eq,
                rhs: Argument::UInt(2),
            },
            body: vec![Instruction::FunctionCall {
                name: "h".into(),
                cargs: vec![],
                qargs: vec![Argument::QuantumReg("q".into())],
            }],
        };
        assert_eq!(instr.emit(), "");
    }

    #[test]
    fn runtime_if_prefixes_every_line() {
        let instr = Instruction::If {
            comparison: Comparison {
                lhs: Argument::CReg("c".into()),
                op: CompareOp::Eq,
                rhs: Argument::UInt(1),
            },
            body: vec![
                Instruction::FunctionCall {
                    name: "h".into(),
                    cargs: vec![],
                    qargs: vec![Argument::QuantumIndex {
                        name: "q".into(),
                        index: 0,
                    }],
                },
                Instruction::FunctionCall {
                    name: "x".into(),
                    cargs: vec![],
                    qargs: vec![Argument::QuantumIndex {
                        name: "q".into(),
                        index: 1,
                    }],
                },
            ],
        };
        assert_eq!(instr.emit(), "if (c==1) h q[0];\nif (c==1) x q[1];\n");
    }

    #[test]
    fn program_declares_helper_register_first() {
        let program = Program {
            qubits: 3,
            instructions: vec![Instruction::QuantumInitialization {
                name: "q".into(),
                size: 2,
                bits: vec![false, false],
            }],
            dependencies: vec![],
            needs_measurement_qubit: true,
        };
        assert_eq!(program.emit(), "qreg cregmbit[1];\nqreg q[2];\n");
    }

    #[test]
    fn gate_emission() {
        let gate = Gate {
            name: "rotate".into(),
            cargs: vec!["theta".into()],
            qargs: vec!["t".into()],
            instructions: vec![Instruction::FunctionCall {
                name: "rx".into(),
                cargs: vec![Argument::CReg("theta".into())],
                qargs: vec![Argument::QuantumReg("t".into())],
            }],
        };
        assert_eq!(gate.emit(), "gate rotate(theta) t {\nrx(theta) t;\n}\n");
    }

    #[test]
    fn gate_without_cargs_has_no_parens() {
        let gate = Gate {
            name: "flip".into(),
            cargs: vec![],
            qargs: vec!["a".into(), "b".into()],
            instructions: vec![],
        };
        assert_eq!(gate.emit(), "gate flip a, b {\n}\n");
    }
}
