/*!

This is the long-form manual for `seat_lottery` and the `sorteio` command.

## Categories

Every candidate belongs to exactly one of three categories, in this order of priority:

1. `Aluno`
2. `Servidor`
3. `Comunidade Externa`

The order is used everywhere a seat has to be given to "someone": the seats lost to
rounding, the seats that a category cannot fill, and the order of the output lists.

## How seats are shared

Given `N` seats and the percentages `p_aluno`, `p_servidor`, `p_comunidade`:

1. Each category is reserved `floor(N * p)` seats. The percentages must be within `[0, 1]`
   and sum to at most `1`. They do not need to sum to exactly `1`: whatever is not
   reserved is treated like the seats lost to rounding.
2. The seats not reserved (the *leftover*) are given one at a time to `Aluno`,
   `Servidor`, `Comunidade Externa`, `Aluno` again, and so on.
3. The categories are then drawn in order of priority. The candidates of a category are
   shuffled and the first ones are approved, up to the quota of the category. The others
   form the waitlist of the category, in the order of the draw.
4. If a category has fewer candidates than its quota, the missing seats are added to the
   quota of the next category. They are never given back to a category that was already
   drawn.
5. If some seats are still free once `Comunidade Externa` has been drawn, they are given
   to the waitlists, starting with the head of the `Aluno` waitlist, then `Servidor`, then
   `Comunidade Externa`.

As a consequence, all the seats are filled as long as there are enough candidates, and
no candidate is ever moved to another category.

For example, with 7 seats and `0.5 / 0.3 / 0.2`, the reserved seats are `3 / 2 / 1` and
the leftover seat goes to `Aluno`: the quotas are `4 / 2 / 1`. If only 2 `Aluno`
candidates registered, both are approved and `Servidor` is drawn against a quota of 4.

## Reproducibility

A draw depends on three things only: the candidates (in the order of the input file), the
percentages and the seats, and the seed. Anyone holding them can run the draw again and
obtain the same approved list and the same waitlist, in the same order.

Each category uses its own random stream, derived from the seed and the name of the
category (and the name of the class, when drawing per class). The derivation uses
SHA-256 and the ChaCha20 generator, which behave identically on every platform.

## Draws per class

A selection process often opens several classes ("turmas"), each with its own seats. In
this mode, each class is drawn on its own, with the same percentages and seed. The seats of
a class come from the input file (column `Quantidade vagas [Vaga]`), from an explicit
list (`--vagas-por-turma "T1=3;T2=5"`), or from `--vagas` for the classes that have no
count. A class without any seat count is an error: nothing is drawn. A seat count given
for a class that is not in the input is reported and ignored.

## Input formats

Both CSV and Excel (`.xlsx`) files are accepted, in one of two layouts.

### Simple

Columns `id`, `nome` and `categoria` are required. `categoria` contains one of `Aluno`,
`Servidor`, `Comunidade Externa`. An optional `turma` column names the class.

### Registration export

Recognized by the columns `Turma [Vaga]` and `Nome [Candidato]`. The category comes from
the columns `Aluno [Candidato]`, `Servidor [Candidato]` and `Externo [Candidato]`: the
highest priority column marked as true (`true`, `1`, `sim`, `yes` or `y`) wins. A
candidate with none of them is an error. The id comes from `Id [Candidato]`.

The columns `Aluno [Vaga]`, `Servidor [Vaga]` and `Externo [Vaga]` tell which categories a
class is open to, as read on its first row. When drawing per class, candidates of a
category the class is closed to are left out of the draw, with a warning, and listed as
`excluded` in the JSON summary. The closed categories get no seats by percentage.

All the columns of the input are kept with the candidate, and a `categoria` column is added.

## Outputs

The approved list and the waitlist are printed on the terminal and can be written as CSV
files with the columns `Id [Candidato]`, `Número de sorteio`, `Nome [Candidato]`,
`Turma [Vaga]` and `Categoria`. A JSON summary (`--out`) records the configuration, the
quotas of each category and the ids drawn; it can be checked later against a new run with
`--reference`.
*/
