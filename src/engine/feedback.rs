//! Fixed message templates: the daily survey prompt, the feedback report,
//! and the rejection/acknowledgment replies.

use pulse_core::model::{Scores, WeeklyTotals};

/// Reply sent when an inbound SMS fails to parse.
pub const INVALID_FORMAT_REPLY: &str = "\u{274c} Invalid format. Please reply with: \"joy,achievement,meaningfulness,free_text\" (e.g., \"8,7,9,Great day!\")";

/// Reply sent when the sender already has a response stored for today.
pub const ALREADY_RESPONDED_REPLY: &str =
    "\u{2705} You've already responded today! Thank you for participating.";

/// The daily survey prompt, linking the equivalent web form.
pub fn survey_prompt(base_url: &str) -> String {
    format!(
        "\u{1f31f} Daily Life Check-in \u{1f31f}\n\
         \n\
         How was your day yesterday? Please rate each area (1-10):\n\
         \n\
         1\u{fe0f}\u{20e3} Joy: How much joy did you get?\n\
         2\u{fe0f}\u{20e3} Achievement: How much achievement did you get?\n\
         3\u{fe0f}\u{20e3} Meaningfulness: How much meaningfulness did you get?\n\
         4\u{fe0f}\u{20e3} What influenced your ratings most? (free text)\n\
         \n\
         Reply with your scores like: \"8,7,9,Spent time with family\"\n\
         \n\
         Or visit: {base_url}/survey\n\
         \n\
         Thank you for participating! \u{1f64f}"
    )
}

/// The feedback report: today's scores, their mean to one decimal, the
/// rolling 7-day totals, and a motivational tier.
pub fn feedback_message(scores: &Scores, weekly: &WeeklyTotals) -> String {
    let mean = scores.mean();
    format!(
        "\u{1f4ca} Your Scores:\n\
         Joy: {}/10\n\
         Achievement: {}/10\n\
         Meaningfulness: {}/10\n\
         Average: {:.1}/10\n\
         \n\
         \u{1f4c8} Weekly Totals:\n\
         Joy: {}\n\
         Achievement: {}\n\
         Meaningfulness: {}\n\
         \n\
         {}",
        scores.joy,
        scores.achievement,
        scores.meaningfulness,
        mean,
        weekly.joy,
        weekly.achievement,
        weekly.meaningfulness,
        motivational_tier(mean)
    )
}

/// Select one of the four fixed motivational messages by mean score.
/// Boundaries are lower-inclusive: 8.0 is enthusiastic, 7.99 is encouraging.
pub fn motivational_tier(mean: f64) -> &'static str {
    if mean >= 8.0 {
        "\u{1f389} Amazing! You're thriving! Keep up the great work!"
    } else if mean >= 6.0 {
        "\u{1f44d} Good progress! You're on the right track!"
    } else if mean >= 4.0 {
        "\u{1f4aa} Keep going! Every day is a chance to grow!"
    } else {
        "\u{1f917} Remember, it's okay to have tough days. Tomorrow is a new opportunity!"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries_are_lower_inclusive() {
        assert!(motivational_tier(8.0).contains("Amazing"));
        assert!(motivational_tier(9.7).contains("Amazing"));
        assert!(motivational_tier(7.9).contains("Good progress"));
        assert!(motivational_tier(6.0).contains("Good progress"));
        assert!(motivational_tier(5.9).contains("Keep going"));
        assert!(motivational_tier(4.0).contains("Keep going"));
        assert!(motivational_tier(3.9).contains("tough days"));
        assert!(motivational_tier(1.0).contains("tough days"));
    }

    #[test]
    fn test_feedback_reports_scores_and_mean() {
        let scores = Scores {
            joy: 8,
            achievement: 7,
            meaningfulness: 9,
        };
        let weekly = WeeklyTotals {
            joy: 30,
            achievement: 28,
            meaningfulness: 33,
        };
        let msg = feedback_message(&scores, &weekly);
        assert!(msg.contains("Joy: 8/10"));
        assert!(msg.contains("Achievement: 7/10"));
        assert!(msg.contains("Meaningfulness: 9/10"));
        assert!(msg.contains("Average: 8.0/10"));
        assert!(msg.contains("Joy: 30"));
        assert!(msg.contains("Amazing"));
    }

    #[test]
    fn test_mean_is_shown_to_one_decimal() {
        let scores = Scores {
            joy: 8,
            achievement: 7,
            meaningfulness: 8,
        };
        // 23 / 3 = 7.666...
        let msg = feedback_message(&scores, &WeeklyTotals::default());
        assert!(msg.contains("Average: 7.7/10"));
        assert!(msg.contains("Good progress"));
    }

    #[test]
    fn test_survey_prompt_links_web_form() {
        let prompt = survey_prompt("https://pulse.example.com");
        assert!(prompt.contains("https://pulse.example.com/survey"));
        assert!(prompt.contains("Reply with your scores like"));
    }
}
