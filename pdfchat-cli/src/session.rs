use pdfchat_shared::ChatMessage;

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
/// Characters of the document sent along with each question.
const CONTEXT_CHARS: usize = 1000;

/// A loaded document the user is asking questions about.
pub struct Session {
    pdf_text: String,
}

impl Session {
    pub fn new(pdf_text: String) -> Self {
        Self { pdf_text }
    }

    pub fn is_empty(&self) -> bool {
        self.pdf_text.trim().is_empty()
    }

    pub fn question(&self, question: &str) -> Vec<ChatMessage> {
        let context: String = self.pdf_text.chars().take(CONTEXT_CHARS).collect();
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "PDF Content: {context}... \n\nQuestion: {question}"
            )),
        ]
    }
}

#[derive(Debug, PartialEq)]
pub enum Input<'a> {
    Blank,
    Quit,
    Clear,
    Question(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Blank,
        "/quit" | "/exit" => Input::Quit,
        "/clear" => Input::Clear,
        question => Input::Question(question),
    }
}
