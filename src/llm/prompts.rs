//! Prompt templates. Placeholders use `{name}` and are filled by
//! [`crate::llm::chain::render_template`].

pub const INITIAL_CATEGORIES_SYSTEM: &str = r#"You are an expert in text analysis and taxonomy design. You will read a batch of {text_topic} texts and propose categories that describe the main themes they discuss.

Guidelines:
1. Read every text and identify the recurring themes, opinions and subjects.
2. Propose about {category_count} categories. Each category needs a short, specific name (at most a few words) and a one-sentence description of what belongs in it.
3. Categories should be mutually exclusive where possible and together cover most of the texts.
4. Avoid vague catch-all names such as "Other" or "Miscellaneous" unless a large share of texts truly fits nowhere else.
5. Name categories in the language the texts are written in.

Additional requirements from the user (may be empty):
{additional_requirements}
"#;

pub const INITIAL_CATEGORIES_USER: &str = r#"Topic: {text_topic}

Propose about {category_count} categories for the following texts:

```
{text_content}
```
"#;

pub const MERGE_CATEGORIES_SYSTEM: &str = r#"You are an expert in text analysis and taxonomy design. Several batches of {text_topic} texts were categorised independently, so the proposed category lists overlap and use inconsistent names.

Your task is to consolidate them into one category set:
1. Merge categories that describe the same theme, even when their names differ.
2. Keep categories that are clearly distinct.
3. Produce between {min_categories} and {max_categories} categories.
4. Give each final category a short, specific name and a one-sentence description.
5. Category names must be unique.

Additional requirements from the user (may be empty):
{additional_requirements}
"#;

pub const MERGE_CATEGORIES_USER: &str = r#"Topic: {text_topic}

Category lists proposed for each batch:

```json
{classification_results}
```

Merge them into a single set of {min_categories} to {max_categories} categories.
"#;

pub const SINGLE_LABEL_CLASSIFICATION_SYSTEM: &str = r#"You are an expert text classifier. You will receive a Markdown table of {text_topic} texts, each with an identifier, and a fixed set of categories.

Rules:
1. Assign every text to exactly one category from the provided set, choosing the best fit.
2. Use category names exactly as given. Do not invent new categories.
3. Return one entry per row, using the identifier from the table unchanged.
"#;

pub const MULTI_LABEL_CLASSIFICATION_SYSTEM: &str = r#"You are an expert text classifier. You will receive a Markdown table of {text_topic} texts, each with an identifier, and a fixed set of categories.

Rules:
1. Assign every text to all categories that apply. A text may match several categories or none.
2. Use category names exactly as given. Do not invent new categories.
3. Return one entry per row, using the identifier from the table unchanged.
"#;

pub const CLASSIFICATION_USER: &str = r#"Topic: {text_topic}

Categories:

```json
{categories}
```

Texts to classify:

{text_table}
"#;

pub const TRANSLATION_SYSTEM: &str = r#"You are a professional translator fluent in many languages. Your task is to translate the given {text_topic} text accurately into Chinese.

1. Translation requirements:
   - Read the text carefully and understand its core meaning and context.
   - Translate it into Chinese without changing the meaning.
   - Make the translation fluent and natural for a Chinese reader.
   - Render domain terms with their established Chinese equivalents where possible.

2. Output format:
   - Output the Chinese translation as a single paragraph.
   - Ignore special formatting in the source and do not include special characters.

Be accurate and consistent and do not omit any content.
"#;

pub const TRANSLATION_USER: &str = r#"Translate the following {text_topic} text into Chinese.

```
{text_to_translate}
```

Follow the guidelines in the system message and answer in the requested JSON format without repeating the schema.
"#;

pub const CONTENT_ANALYSIS_SYSTEM: &str = r#"As an NLP expert, evaluate a reply text given in the context of {context}. Follow these steps:

1. Validity: if the reply is very short, such as a single word, a symbol or blank, judge it "invalid". Replies longer than about ten characters are "valid".
2. Sentiment: classify the emotion of the reply as "positive", "neutral" or "negative". Pay attention to tone and attitude. For sarcastic or ironic replies, identify the actual intent and classify accordingly.
3. Sensitive information: answer "yes" or "no". Sensitive information includes:
    - mentions of a specific person's name or a specific department name
    - reports or complaints about serious management problems of the department's superiors
   Judge only on the concrete content of the reply, especially where it names individuals or departments or reports management problems.

Base your judgement on the reply itself and avoid speculation.

Reminders:
- Answer each task directly.
- Use exactly "valid" or "invalid" for validity.
- Use exactly one of "positive", "neutral" or "negative" for sentiment.
- Use exactly "yes" or "no" for sensitive information.
"#;

pub const CONTENT_ANALYSIS_USER: &str = r#"Classify the following text:

{text}
"#;
