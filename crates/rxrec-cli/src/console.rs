//! Terminal presenter and reader for interactive resolution.

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use rxrec_match::{Candidate, CandidateMenu, CandidatePresenter, ChoiceReader, Rejection};
use rxrec_model::SourceRecord;

pub const PROMPT: &str = "Any of these look right? ";

/// Render a record and its numbered candidates.
pub fn render_menu(record: &SourceRecord, menu: &CandidateMenu) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "{}", record.display_name);
    text.push_str("0) None of these\n");
    for candidate in &menu.candidates {
        let _ = write!(text, "{}) {}\t({})", candidate.number, candidate.name, candidate.code);
        if let Some(detail) = &candidate.detail {
            let _ = write!(text, ",\te.g. {detail}");
        }
        text.push('\n');
    }
    text
}

/// Writes menus and feedback to a terminal-like sink.
pub struct ConsolePresenter<W> {
    out: W,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CandidatePresenter for ConsolePresenter<W> {
    fn present(&mut self, record: &SourceRecord, menu: &CandidateMenu) -> io::Result<()> {
        self.out.write_all(render_menu(record, menu).as_bytes())
    }

    fn rejected(&mut self, input: &str, rejection: &Rejection) -> io::Result<()> {
        match rejection {
            Rejection::NotANumber => {
                writeln!(self.out, "{} is not a valid input. Try again.", input.trim())
            }
            Rejection::OutOfRange(_) => writeln!(self.out, "{rejection}. Try again."),
        }
    }

    fn chosen(&mut self, _record: &SourceRecord, candidate: &Candidate) -> io::Result<()> {
        writeln!(self.out, "chose {} ({})\n", candidate.name, candidate.code)
    }
}

/// Prompts on one sink and reads answers line by line from another source.
pub struct LineReader<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> LineReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> ChoiceReader for LineReader<R, W> {
    fn read_choice(&mut self) -> io::Result<Option<String>> {
        self.prompt_out.write_all(PROMPT.as_bytes())?;
        self.prompt_out.flush()?;
        // Undecodable bytes become U+FFFD and are rejected like any other typo.
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(self.prompt_out)?;
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use rxrec_match::CandidateOrigin;

    use super::*;

    fn menu() -> CandidateMenu {
        let candidate = |number, origin, name: &str, code: &str, detail: Option<&str>| Candidate {
            number,
            origin,
            name: name.to_string(),
            code: code.to_string(),
            detail: detail.map(str::to_string),
        };
        CandidateMenu {
            candidates: vec![
                candidate(1, CandidateOrigin::Local, "paracetamol", "L1", Some("Paracetamol 500mg")),
                candidate(3, CandidateOrigin::BestDictionary, "acetaminophen", "CIEL:70116", None),
                candidate(4, CandidateOrigin::Dictionary, "acetaminophen", "CIEL:70116", None),
            ],
        }
    }

    #[test]
    fn menu_lists_candidates_with_codes() {
        let record = SourceRecord::new("S1", "Paracetamol 500 mg tableta", "oral", "paracetamol");
        insta::assert_snapshot!(
            render_menu(&record, &menu()),
            @"Paracetamol 500 mg tableta\n0) None of these\n1) paracetamol\t(L1),\te.g. Paracetamol 500mg\n3) acetaminophen\t(CIEL:70116)\n4) acetaminophen\t(CIEL:70116)\n"
        );
    }

    #[test]
    fn reader_prompts_and_reports_end_of_input() {
        let mut prompts = Vec::new();
        let mut reader = LineReader::new("3\r\nabc\n".as_bytes(), &mut prompts);

        assert_eq!(reader.read_choice().unwrap().as_deref(), Some("3"));
        assert_eq!(reader.read_choice().unwrap().as_deref(), Some("abc"));
        assert_eq!(reader.read_choice().unwrap(), None);
        drop(reader);

        assert_eq!(
            String::from_utf8(prompts).unwrap(),
            format!("{PROMPT}{PROMPT}{PROMPT}\n")
        );
    }

    #[test]
    fn undecodable_input_is_read_as_a_line() {
        let mut prompts = Vec::new();
        let mut reader = LineReader::new(&b"\xff\xfe\n3\n"[..], &mut prompts);

        let garbled = reader.read_choice().unwrap().unwrap();
        assert_eq!(garbled, "\u{fffd}\u{fffd}");
        assert_eq!(
            rxrec_match::parse_choice(&garbled, &menu()),
            Err(Rejection::NotANumber)
        );
        assert_eq!(reader.read_choice().unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn presenter_explains_rejections() {
        let mut presenter = ConsolePresenter::new(Vec::new());
        presenter.rejected("abc\n", &Rejection::NotANumber).unwrap();
        presenter.rejected("12", &Rejection::OutOfRange(12)).unwrap();

        assert_eq!(
            String::from_utf8(presenter.into_inner()).unwrap(),
            "abc is not a valid input. Try again.\n12 is not one of the listed options. Try again.\n"
        );
    }
}
