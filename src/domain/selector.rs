use crate::domain::model::{Question, QuestionId, QuizOutcome};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Picks one question not in `previously_served`, uniformly at random among
/// the remaining ones.
pub fn select_next<R: Rng + ?Sized>(
    questions: &[Question],
    previously_served: &HashSet<QuestionId>,
    rng: &mut R,
) -> QuizOutcome {
    let remaining: Vec<&Question> = questions
        .iter()
        .filter(|question| !previously_served.contains(&question.id))
        .collect();

    match remaining.choose(rng) {
        Some(question) => QuizOutcome::Next((*question).clone()),
        None => QuizOutcome::Exhausted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn questions(ids: &[QuestionId]) -> Vec<Question> {
        ids.iter()
            .map(|&id| Question {
                id,
                question: format!("Question {}", id),
                answer: format!("Answer {}", id),
                category: 1,
                difficulty: 1,
            })
            .collect()
    }

    fn served(ids: &[QuestionId]) -> HashSet<QuestionId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_never_returns_served_question() {
        let pool = questions(&[1, 2, 3]);
        let previous = served(&[1]);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            match select_next(&pool, &previous, &mut rng) {
                QuizOutcome::Next(question) => assert!(question.id == 2 || question.id == 3),
                QuizOutcome::Exhausted => panic!("two questions are still available"),
            }
        }
    }

    #[test]
    fn test_single_served_question_is_exhausted() {
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = select_next(&questions(&[1]), &served(&[1]), &mut rng);
        assert_eq!(outcome, QuizOutcome::Exhausted);
    }

    #[test]
    fn test_empty_pool_is_exhausted() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_next(&[], &served(&[]), &mut rng).is_exhausted());
        assert!(select_next(&[], &served(&[4, 5]), &mut rng).is_exhausted());
    }

    #[test]
    fn test_all_served_is_exhausted() {
        let mut rng = StdRng::seed_from_u64(9);
        let outcome = select_next(&questions(&[3, 5, 8]), &served(&[8, 3, 5]), &mut rng);
        assert!(outcome.is_exhausted());
    }

    #[test]
    fn test_unknown_served_ids_are_ignored() {
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = select_next(&questions(&[1]), &served(&[99, 100]), &mut rng);
        assert_eq!(outcome.into_question().map(|q| q.id), Some(1));
    }

    #[test]
    fn test_distribution_covers_every_remaining_question() {
        let pool = questions(&[1, 2, 3, 4]);
        let previous = served(&[2]);
        let mut rng = StdRng::seed_from_u64(2024);
        let mut counts: HashMap<QuestionId, usize> = HashMap::new();

        for _ in 0..3000 {
            if let QuizOutcome::Next(question) = select_next(&pool, &previous, &mut rng) {
                *counts.entry(question.id).or_default() += 1;
            }
        }

        assert!(!counts.contains_key(&2));
        for id in [1, 3, 4] {
            // 期望值 1000
            let count = counts.get(&id).copied().unwrap_or(0);
            assert!(count > 800 && count < 1200, "id {} drawn {} times", id, count);
        }
    }

    #[test]
    fn test_walks_through_whole_pool_without_repeats() {
        let pool = questions(&[10, 20, 30, 40, 50]);
        let mut previous = HashSet::new();
        let mut rng = StdRng::seed_from_u64(7);

        while let QuizOutcome::Next(question) = select_next(&pool, &previous, &mut rng) {
            assert!(previous.insert(question.id), "question {} repeated", question.id);
        }

        assert_eq!(previous.len(), pool.len());
    }
}
