//! Grounded prompt composition.

use localrag_core::error::{Error, Result};

pub const PLACEHOLDER: &str = "{}";

/// System instruction; the single placeholder receives the retrieved passage.
pub const INSTRUCTION_TEMPLATE: &str = concat!(
    "You are an extremely knowledgable expert.\n",
    "You always provide the most accurate information in a succinct manner.\n",
    "If you don't know the answer to something, you are honest about it.\n",
    "\n",
    "Here is some additional information that might be helpful to you:\n",
    "\n",
    "    {}\n",
    "\n",
    "Do not quote this text verbatim and do not explicitly mention the source.\n",
    "\n",
    "If you are asked a question, start your response by repeating the question (in a\n",
    "concise form) and then provide your answer.\n",
);

/// Llama 3 role markup; placeholders take the instruction then the question.
pub const LLAMA3_WRAPPER_TEMPLATE: &str = concat!(
    "\n",
    "    <|begin_of_text|><|start_header_id|>system<|end_header_id|>\n",
    "\n",
    "    {}<|eot_id|><|start_header_id|>user<|end_header_id|>\n",
    "\n",
    "    {}<|eot_id|><|start_header_id|>assistant<|end_header_id|>\n",
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    instruction: String,
    wrapper: String,
}

impl PromptTemplate {
    pub fn new(instruction: impl Into<String>, wrapper: impl Into<String>) -> Result<Self> {
        let instruction = instruction.into();
        let wrapper = wrapper.into();
        check_placeholders("instruction", &instruction, 1)?;
        check_placeholders("wrapper", &wrapper, 2)?;
        Ok(Self { instruction, wrapper })
    }

    pub fn llama3() -> Self {
        Self { instruction: INSTRUCTION_TEMPLATE.to_string(), wrapper: LLAMA3_WRAPPER_TEMPLATE.to_string() }
    }

    /// Passage goes into the instruction, then instruction and question go
    /// into the wrapper. Inserted text is never rescanned for placeholders.
    pub fn compose(&self, query: &str, grounding: &str) -> String {
        let instruction = fill(&self.instruction, &[grounding]);
        fill(&self.wrapper, &[&instruction, query])
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::llama3()
    }
}

fn check_placeholders(which: &str, template: &str, expected: usize) -> Result<()> {
    let found = template.matches(PLACEHOLDER).count();
    if found != expected {
        return Err(Error::InvalidArgument(format!("{which} template needs {expected} placeholder(s), found {found}")));
    }
    Ok(())
}

fn fill(template: &str, values: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + values.iter().map(|v| v.len()).sum::<usize>());
    let mut pieces = template.split(PLACEHOLDER);
    if let Some(first) = pieces.next() {
        out.push_str(first);
    }
    for (piece, value) in pieces.zip(values.iter().chain(std::iter::repeat(&""))) {
        out.push_str(value);
        out.push_str(piece);
    }
    out
}
