// src/prompts.rs
//
// Fixed prompt text for the two generation stages. Read-only process-wide;
// the style prompt carries a `{mermaid_code}` placeholder filled in by the
// style stage.

pub const DRAFT_PROMPT: &str = r#"
Generate a mermaid chart based on the textual or structural information in the image.
If the image is unclear or includes graphical content that cannot be directly transcribed, offer logical interpretations to recreate the intended chart.

## Steps

1. Understand Content:
Review the screenshot provided by the user.
Understand textual or visual elements (e.g., labels, connections, flow) from the image.
If the content is ambiguous, provide logical interpretations while maintaining the user's intent.

2. Chart Type Identification:
Based on the screenshot, determine the most appropriate Mermaid.js chart type:
- Flowchart: For processes or workflows.
- Mindmap: For brainstorming or planning.
- Other types, as inferred from the screenshot.

3. Construct the Chart:
- Use Mermaid.js syntax to define nodes, edges, and labels based on extracted content.
- Maintain clarity and logical structure.
- Fill gaps or ambiguities based on the context provided.

4. Validate the Chart:
- Ensure the output aligns with Mermaid.js conventions.
- Test readability and coherence in the chart's flow or structure.

## Output

1. Schema:
Return your response as a JSON object with this structure:
{
    "chartType": A Mermaid chart type based on the structure identified in the image,
    "reason": A one-sentence explanation of why this chart type best fits the image content,
    "code": The complete Mermaid.js diagram code
}

2. Example:
{
    "chartType": "flowchart",
    "reason": "The image shows sequential steps connected by arrows indicating a process flow",
    "code": "flowchart TB\n  A[Start] --> B[Process]\n  B --> C[End]"
}

## Notes

If the screenshot includes a combination of text and graphics, focus on text and logical flow inferred from the visuals.

## Important

Return ONLY the JSON response without any explanation or code blocks.
"#;

pub const STYLE_GUIDE: &str = r#"
# Style Guide

## Mindmap Style

Apply the following styling rules to the Mermaid.js mindmap diagram while preserving the original structure and labels:

1. Determine node types and symbols:
   - Root nodes: ((text))
   - Main branch nodes: [text]
   - Sub-branch nodes: {{text}}
   - Leaf nodes: )text(

2. Respect the depth of the hierarchy:
   - Do not add additional depth, nodes, or node types if they are not present in the draft.
   - If a level of the hierarchy (e.g., sub-branch or leaf) is missing, skip its representation entirely.

3. Node hierarchy:
   - Use indentation to define parent-child relationships.
   - Root connects to main branches.
   - Main branches connect to sub-branches.
   - Sub-branches connect to leaves.

4. Output example:
mindmap
  root((Central Concept))
    [Main Branch 1]
      {{Subtopic 1}}
        )Leaf Node 1(
        )Leaf Node 2(
      {{Subtopic 2}}
    [Main Branch 2]
      {{Subtopic 3}}
        )Leaf Node 3(

5. Important: Ensure no extra nodes are added if they are not present in the original draft. Return ONLY the styled Mermaid.js code without any explanation or code blocks.

## Flowchart Style

Apply the following styling rules to the Mermaid.js diagram while preserving the original structure and labels:

1. Determine node types and styles:
   - Start/End nodes: ([text]):::terminator
   - Process nodes: [text]:::process
   - Decision nodes: {text}:::decision
   - Input/Output nodes: [/text/]:::inputOutput
   - Database nodes: [(text)]:::database

2. Apply class definitions:
classDef terminator fill:#f9f,stroke:#333,stroke-width:2px,color:#333,stroke-dasharray:5 5;
classDef process fill:#fff9c4,stroke:#fbc02d,stroke-width:2px,color:#333;
classDef decision fill:#e1bee7,stroke:#6a1b9a,stroke-width:2px,color:#333;
classDef inputOutput fill:#d1edf2,stroke:#0277bd,stroke-width:2px,color:#333;
classDef database fill:#e8f5e9,stroke:#2e7d32,stroke-width:2px,color:#333;

3. Flow direction:
   - Use TB (top to bottom) for vertical flows
   - Use LR (left to right) for horizontal flows
   - Maintain the original flow direction if specified

4. Link styles:
   - Normal flow: -->
   - Labeled flow: -->|text|
   - Alternative flow: -.->
   - Thick flow: ==>

5. Example output:
flowchart TB
    %% Symbol definitions
    A([Start/End]):::terminator
    B[Process]:::process
    C{Decision}:::decision
    D[/Input/Output/]:::inputOutput
    F[(Database)]:::database

    %% Syntax definitions
    A --> B
    B --> C
    C -->|Yes| D
    C -->|No| F

    %% Styling definitions
    classDef terminator fill:#f9f,stroke:#333,stroke-width:2px,color:#333,stroke-dasharray:5 5;
    classDef process fill:#fff9c4,stroke:#fbc02d,stroke-width:2px,color:#333;
    classDef decision fill:#e1bee7,stroke:#6a1b9a,stroke-width:2px,color:#333;
    classDef inputOutput fill:#d1edf2,stroke:#0277bd,stroke-width:2px,color:#333;
    classDef database fill:#e8f5e9,stroke:#2e7d32,stroke-width:2px,color:#333;

6. Important: Return ONLY the styled Mermaid.js code without any explanation or code blocks.
"#;

pub const STYLE_PROMPT: &str = r#"
Apply the style guide to the following Mermaid code. Do not change the labels, only apply proper styling and formatting.
Keep the original flow and structure intact. Return only the Mermaid.js code without any explanations or code blocks.
I repeat, do not use CODE BLOCKS.

Code:
{mermaid_code}
"#;
