//! Sample health queries used by the demo, batch and compare modes.

pub const SAMPLE_QUERIES: [&str; 8] = [
    "How has my sleep quality been over the past month? Are there any patterns I should be aware of?",
    "I want to improve my cardiovascular health. What do my heart rate and activity data suggest?",
    "My father has Type 2 diabetes. Based on my data, what's my risk and what should I do?",
    "I've been feeling more tired lately. Can you analyze my recent health data to help understand why?",
    "Help me create a realistic exercise plan that fits my current activity level and health profile.",
    "What does my recent lab work say about my cholesterol? Should I be concerned?",
    "I want to lose 10 pounds over the next 3 months. Can you help me set up a plan?",
    "How does my heart rate variability compare to healthy ranges? What does this mean for my stress levels?",
];

pub fn sample_queries() -> &'static [&'static str] {
    &SAMPLE_QUERIES
}
