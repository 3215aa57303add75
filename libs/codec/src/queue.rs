//! Client queue reader
//!
//! The queue is a text stream of `client_id gender rent_duration` triples
//! separated by any whitespace, read strictly in order. Records may span
//! lines. The first malformed or incomplete record ends the queue.

use crate::error::QueueError;
use hotel_types::{ClientId, ClientRequest, Gender};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Sequential reader over client records
pub struct ClientQueue<R> {
    reader: R,
    tokens: VecDeque<(usize, String)>,
    line: usize,
    finished: bool,
}

impl ClientQueue<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ClientQueue<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            tokens: VecDeque::new(),
            line: 0,
            finished: false,
        }
    }

    /// Next record, `Ok(None)` once the queue is exhausted.
    ///
    /// After an error the queue is finished and keeps returning `Ok(None)`.
    pub fn next_request(&mut self) -> Result<Option<ClientRequest>, QueueError> {
        if self.finished {
            return Ok(None);
        }

        let result = self.read_record();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    fn read_record(&mut self) -> Result<Option<ClientRequest>, QueueError> {
        while self.tokens.len() < 3 {
            if !self.fill()? {
                return match self.tokens.len() {
                    0 => Ok(None),
                    found => Err(QueueError::Incomplete { found }),
                };
            }
        }

        let mut values = [0i32; 3];
        for value in values.iter_mut() {
            if let Some((line, token)) = self.tokens.pop_front() {
                *value = token
                    .parse()
                    .map_err(|_| QueueError::Malformed { line, token })?;
            }
        }
        let [id, gender, rent] = values;
        let line = self.line;

        let gender =
            Gender::try_from(gender).map_err(|_| QueueError::InvalidGender { line, value: gender })?;
        let rent_duration =
            u32::try_from(rent).map_err(|_| QueueError::NegativeDuration { line, value: rent })?;

        Ok(Some(ClientRequest::new(ClientId(id), gender, rent_duration)))
    }

    /// Read one more line into the token buffer. Returns false at EOF.
    fn fill(&mut self) -> Result<bool, QueueError> {
        let mut buf = String::new();
        if self.reader.read_line(&mut buf)? == 0 {
            return Ok(false);
        }
        self.line += 1;
        let line = self.line;
        self.tokens
            .extend(buf.split_whitespace().map(|t| (line, t.to_string())));
        Ok(true)
    }
}

impl<R: BufRead> Iterator for ClientQueue<R> {
    type Item = Result<ClientRequest, QueueError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_request().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn queue(text: &str) -> ClientQueue<Cursor<&str>> {
        ClientQueue::new(Cursor::new(text))
    }

    #[test]
    fn test_reads_records_in_order() {
        let mut q = queue("1 0 5\n2 1 3\n");
        assert_eq!(
            q.next_request().unwrap(),
            Some(ClientRequest::new(ClientId(1), Gender::Male, 5))
        );
        assert_eq!(
            q.next_request().unwrap(),
            Some(ClientRequest::new(ClientId(2), Gender::Female, 3))
        );
        assert!(q.next_request().unwrap().is_none());
        assert!(q.next_request().unwrap().is_none());
    }

    #[test]
    fn test_records_may_span_lines() {
        let requests: Vec<_> = queue("1 0\n5 2\n1 3   \n\n")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            requests,
            vec![
                ClientRequest::new(ClientId(1), Gender::Male, 5),
                ClientRequest::new(ClientId(2), Gender::Female, 3),
            ]
        );
    }

    #[test]
    fn test_malformed_value_ends_queue() {
        let mut q = queue("1 0 5\n2 x 3\n3 0 1\n");
        assert!(q.next_request().unwrap().is_some());
        assert!(matches!(
            q.next_request(),
            Err(QueueError::Malformed { line: 2, ref token }) if token == "x"
        ));
        assert!(q.next_request().unwrap().is_none());
    }

    #[test]
    fn test_incomplete_trailing_record() {
        let mut q = queue("1 0 5\n2 1");
        assert!(q.next_request().unwrap().is_some());
        assert!(matches!(
            q.next_request(),
            Err(QueueError::Incomplete { found: 2 })
        ));
    }

    #[test]
    fn test_rejects_bad_gender_and_negative_duration() {
        assert!(matches!(
            queue("1 2 5").next_request(),
            Err(QueueError::InvalidGender { value: 2, .. })
        ));
        assert!(matches!(
            queue("1 1 -5").next_request(),
            Err(QueueError::NegativeDuration { value: -5, .. })
        ));
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clients.txt");
        std::fs::write(&path, "7 1 2\n").unwrap();

        let mut q = ClientQueue::open(&path).unwrap();
        assert_eq!(
            q.next_request().unwrap(),
            Some(ClientRequest::new(ClientId(7), Gender::Female, 2))
        );
    }
}
