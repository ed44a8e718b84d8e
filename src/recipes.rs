//! Static last-order and recipe data backing the chef tools.

pub const NO_RECIPES_MESSAGE: &str = "Lo siento, parece que con los ingredientes de tu último pedido no puedes preparar ninguna receta mexicana que yo conozca.";

const LAST_ORDER: &[&str] = &[
    "tomates",
    "cebolla",
    "tortillas de maíz",
    "pollo",
    "queso",
    "aguacate",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipe {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub instructions: &'static str,
}

impl Recipe {
    pub fn can_prepare(&self, available: &[String]) -> bool {
        self.required
            .iter()
            .all(|item| available.iter().any(|a| a == item))
    }

    pub fn render(&self) -> String {
        format!(
            "### {}\n**Instrucciones:** {}\n",
            self.name, self.instructions
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Cuisine {
    pub key: &'static str,
    pub recipes: &'static [Recipe],
}

const BOOK: &[Cuisine] = &[
    Cuisine {
        key: "mexicana",
        recipes: &[
            Recipe {
                name: "Tacos de Pollo",
                required: &["tortillas de maíz", "pollo", "cebolla", "tomates"],
                instructions: "1. Cocina el pollo en trozos pequeños hasta que esté dorado. 2. Pica finamente la cebolla y los tomates. 3. Calienta las tortillas de maíz. 4. Sirve el pollo en las tortillas y añade cebolla y tomate al gusto.",
            },
            Recipe {
                name: "Guacamole",
                required: &["aguacate", "cebolla", "tomates"],
                instructions: "1. Machaca 2-3 aguacates maduros en un bowl. 2. Pica finamente un poco de cebolla y tomate. 3. Mezcla todo junto. 4. Añade sal, pimienta y limón al gusto.",
            },
            Recipe {
                name: "Quesadillas",
                required: &["tortillas de maíz", "queso"],
                instructions: "1. Pon queso rallado en media tortilla de maíz. 2. Dobla la tortilla por la mitad. 3. Cocina en comal caliente por ambos lados hasta que el queso se derrita.",
            },
        ],
    },
    Cuisine {
        key: "colombiana",
        recipes: &[
            Recipe {
                name: "Pollo Guisado Costeño",
                required: &["pollo", "cebolla", "tomates"],
                instructions: "1. Sofríe la cebolla hasta que esté dorada. 2. Agrega el pollo en presas y dora por todos lados. 3. Incorpora los tomates picados y cocina hasta que se forme un guiso espeso. 4. Sazona con sal, comino y deja cocinar a fuego lento 25 minutos.",
            },
            Recipe {
                name: "Arepa Paisa Rellena",
                required: &["tortillas de maíz", "pollo", "queso"],
                instructions: "1. Calienta las tortillas de maíz en un comal. 2. Desmecha el pollo cocido y mezcla con un poco de queso. 3. Rellena las tortillas con la mezcla de pollo y queso. 4. Dobla como empanada y cocina hasta dorar.",
            },
            Recipe {
                name: "Guacamole Costeño",
                required: &["aguacate", "cebolla", "tomates"],
                instructions: "1. Machaca el aguacate muy bien. 2. Pica la cebolla y el tomate en cubitos muy pequeños. 3. Mezcla todo agregando sal y un toque de suero costeño (o sal). 4. Sirve fresco acompañando cualquier comida.",
            },
        ],
    },
    Cuisine {
        key: "argentina",
        recipes: &[
            Recipe {
                name: "Empanadas Criollas",
                required: &["tortillas de maíz", "pollo", "cebolla"],
                instructions: "1. Sofríe la cebolla cortada en juliana hasta que esté transparente. 2. Agrega el pollo desmenuzado y cocina 5 minutos. 3. Sazona con pimentón dulce, comino y sal. 4. Rellena las tortillas, dobla como empanada y cocina en sartén hasta dorar.",
            },
            Recipe {
                name: "Pollo a la Parrilla Porteño",
                required: &["pollo", "tomates", "cebolla"],
                instructions: "1. Marina el pollo con sal gruesa y orégano 30 minutos. 2. Cocina el pollo a la plancha hasta que esté bien dorado. 3. Prepara una salsa criolla con tomate y cebolla picados. 4. Sirve el pollo con la salsa criolla por encima.",
            },
            Recipe {
                name: "Provoleta Casera",
                required: &["queso", "tomates", "cebolla"],
                instructions: "1. Corta el queso en rebanadas gruesas. 2. Cocina en sartén hasta que esté dorado y derretido. 3. Pica tomate y cebolla finamente para hacer chimichurri simple. 4. Sirve el queso caliente con la mezcla de tomate y cebolla encima.",
            },
        ],
    },
    Cuisine {
        key: "española",
        recipes: &[
            Recipe {
                name: "Pollo al Chilindrón",
                required: &["pollo", "tomates", "cebolla"],
                instructions: "1. Sofríe la cebolla en aceite de oliva hasta que esté dorada. 2. Agrega el pollo troceado y dora bien. 3. Incorpora los tomates rallados y cocina hasta reducir. 4. Sazona con pimentón dulce, sal y cocina 20 minutos a fuego lento.",
            },
            Recipe {
                name: "Montadito de Aguacate",
                required: &["tortillas de maíz", "aguacate", "tomates"],
                instructions: "1. Tuesta ligeramente las tortillas de maíz. 2. Machaca el aguacate con un tenedor. 3. Unta el aguacate sobre las tortillas. 4. Corona con tomate picado muy fino y una pizca de sal marina.",
            },
            Recipe {
                name: "Tortilla de Queso Manchega",
                required: &["queso", "cebolla"],
                instructions: "1. Corta la cebolla en juliana fina y sofríe hasta caramelizar. 2. Ralla o corta el queso en láminas. 3. En una sartén, coloca capas de cebolla y queso. 4. Cocina a fuego lento hasta que el queso se derrita y forme una 'tortilla' dorada.",
            },
        ],
    },
];

pub fn last_order() -> Vec<String> {
    LAST_ORDER.iter().map(|s| s.to_string()).collect()
}

pub fn cuisines() -> Vec<&'static str> {
    BOOK.iter().map(|c| c.key).collect()
}

pub fn cuisine(key: &str) -> Option<&'static Cuisine> {
    BOOK.iter().find(|c| c.key == key)
}

/// Recipes of `cuisine` whose required ingredients are all in `ingredients`.
pub fn matching_recipes(cuisine_key: &str, ingredients: &[String]) -> Vec<&'static Recipe> {
    cuisine(cuisine_key)
        .map(|c| c.recipes.iter().filter(|r| r.can_prepare(ingredients)).collect())
        .unwrap_or_default()
}

pub fn find_recipes(cuisine_key: &str, ingredients: &[String]) -> String {
    let found = matching_recipes(cuisine_key, ingredients);
    if found.is_empty() {
        return NO_RECIPES_MESSAGE.to_string();
    }
    found
        .iter()
        .map(|r| r.render())
        .collect::<Vec<_>>()
        .join("\n")
}
