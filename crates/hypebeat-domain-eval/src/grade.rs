use crate::score::{accuracy, ScoreState};
use hypebeat_ports::types::LetterGrade;

const THRESHOLDS: [(f64, LetterGrade); 4] = [
    (0.95, LetterGrade::S),
    (0.85, LetterGrade::A),
    (0.70, LetterGrade::B),
    (0.50, LetterGrade::C),
];

pub fn grade_for_accuracy(accuracy: f64) -> LetterGrade {
    THRESHOLDS
        .iter()
        .find(|(min, _)| accuracy >= *min)
        .map(|(_, grade)| *grade)
        .unwrap_or(LetterGrade::D)
}

/// A session without attempts grades as D.
pub fn grade(state: &ScoreState) -> LetterGrade {
    grade_for_accuracy(accuracy(state))
}
