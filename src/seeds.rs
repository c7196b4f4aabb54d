//! Built-in question bank so a fresh store is usable without the generator service.

use crate::domain::{Difficulty, Question, Topic};

fn q(id: &str, topic: Topic, text: &str, options: [&str; 4], correct: &str, difficulty: Difficulty) -> Question {
  Question {
    id: id.into(),
    topic,
    text: text.into(),
    options: options.iter().map(|o| o.to_string()).collect(),
    correct_answer: correct.into(),
    difficulty,
  }
}

/// Four questions for each of the five stored topics.
pub fn seed_questions() -> Vec<Question> {
  use Difficulty::*;
  use Topic::*;
  vec![
    // Statistics
    q("st-1", Statistics, "What is the mean of the dataset: 2, 4, 6, 8, 10?", ["4", "5", "6", "7"], "C", Easy),
    q("st-2", Statistics, "In a normal distribution, what percentage of data falls within one standard deviation of the mean?", ["68%", "95%", "99.7%", "50%"], "A", Medium),
    q("st-3", Statistics, "What is the median of: 1, 3, 5, 7, 9, 11?", ["5", "6", "7", "8"], "B", Easy),
    q("st-4", Statistics, "What does a p-value of 0.03 indicate in hypothesis testing?", ["Accept null hypothesis", "Reject null hypothesis at α=0.05", "Inconclusive result", "Need more data"], "B", Hard),
    // Data analysis (legacy, sampled together with statistics)
    q("da-1", DataAnalysis, "Which chart type is best for showing trends over time?", ["Pie chart", "Bar chart", "Line chart", "Scatter plot"], "C", Easy),
    q("da-2", DataAnalysis, "What does a correlation coefficient of -0.8 indicate?", ["Strong positive correlation", "Strong negative correlation", "Weak correlation", "No correlation"], "B", Medium),
    q("da-3", DataAnalysis, "In data cleaning, what is the best approach for handling missing values in a time series?", ["Delete all rows with missing values", "Replace with mean", "Forward fill or interpolation", "Replace with zero"], "C", Hard),
    q("da-4", DataAnalysis, "Which measure is most robust to outliers?", ["Mean", "Median", "Range", "Variance"], "B", Medium),
    // Applied math
    q("am-1", AppliedMath, "If f(x) = 2x + 3, what is f(5)?", ["10", "11", "13", "15"], "C", Easy),
    q("am-2", AppliedMath, "What is the derivative of x²?", ["x", "2x", "2", "x²"], "B", Medium),
    q("am-3", AppliedMath, "What is the integral of cos(x) dx?", ["sin(x) + C", "-sin(x) + C", "cos(x) + C", "-cos(x) + C"], "A", Hard),
    q("am-4", AppliedMath, "A price rises from 80 to 100. What is the percentage increase?", ["20%", "25%", "80%", "125%"], "B", Easy),
    // Verbal reasoning
    q("vr-1", VerbalReasoning, "Choose the word that best completes: 'The evidence was _____ and could not be disputed.'", ["ambiguous", "conclusive", "preliminary", "theoretical"], "B", Medium),
    q("vr-2", VerbalReasoning, "What is the antonym of 'abundant'?", ["plentiful", "scarce", "numerous", "ample"], "B", Easy),
    q("vr-3", VerbalReasoning, "If 'perspicacious' means having keen insight, what does 'obtuse' mean in this context?", ["Sharp", "Intelligent", "Dull or slow to understand", "Quick-witted"], "C", Hard),
    q("vr-4", VerbalReasoning, "Book is to reading as fork is to:", ["drawing", "writing", "eating", "stirring"], "C", Easy),
    // General knowledge
    q("gk-1", GeneralKnowledge, "What is the capital of Australia?", ["Sydney", "Melbourne", "Canberra", "Perth"], "C", Easy),
    q("gk-2", GeneralKnowledge, "Which element has the chemical symbol 'Au'?", ["Silver", "Gold", "Aluminum", "Argon"], "B", Medium),
    q("gk-3", GeneralKnowledge, "Who developed the theory of general relativity?", ["Isaac Newton", "Albert Einstein", "Stephen Hawking", "Niels Bohr"], "B", Easy),
    q("gk-4", GeneralKnowledge, "What is the smallest unit of matter that retains the properties of an element?", ["Molecule", "Atom", "Proton", "Electron"], "B", Medium),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ANSWER_LETTERS;
  use std::collections::HashSet;

  #[test]
  fn bank_is_well_formed() {
    let bank = seed_questions();
    let ids: HashSet<&str> = bank.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids.len(), bank.len());
    for question in &bank {
      assert_eq!(question.options.len(), 4, "{}", question.id);
      assert!(ANSWER_LETTERS.contains(&question.correct_answer.as_str()), "{}", question.id);
    }
    for topic in Topic::ALL {
      assert_eq!(bank.iter().filter(|q| q.topic == topic).count(), 4, "{topic}");
    }
  }
}
