use groundqa_core::citation::source_label;
use groundqa_core::types::RetrievedChunk;

const INSTRUCTION: &str = "You are a grounded assistant. Use ONLY the provided context to answer.\n\
If the context does not contain the answer, say \"I don't know\".\n\
Cite every statement with the label of the context entry it comes from, for example [Source 0].";

/// Grounded prompt: instruction, labelled context, question and answer cue.
/// `evidence[i]` is labelled `[Source i]`.
pub fn render_prompt(query: &str, evidence: &[RetrievedChunk]) -> String {
    let context = evidence
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{}: {}", source_label(i), e.chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("SYSTEM INSTRUCTION:\n{INSTRUCTION}\n\nCONTEXT:\n{context}\n\nUSER QUERY:\n{query}\n\nANSWER:\n")
}
